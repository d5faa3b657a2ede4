//! Strongly-typed identifiers.
//!
//! All IDs are validated at construction time and implement common traits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed string ID newtype wrapper.
///
/// Generates: struct, `from_string()`, `as_str()`, Display, Serialize, Deserialize.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: String) -> Result<Self, &'static str> {
                if s.is_empty() {
                    return Err(concat!(stringify!($name), " cannot be empty"));
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(ServiceId);

/// Platform-assigned identity of one running instance of this facade.
///
/// Handed out by the registration endpoint and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceIdentity {
    pub service_id: ServiceId,
    pub instance_id: i64,
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_id, self.instance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_id_rejected() {
        assert!(ServiceId::from_string(String::new()).is_err());
        assert_eq!(
            ServiceId::from_string("MCP-Server".to_string()).unwrap().as_str(),
            "MCP-Server"
        );
    }

    #[test]
    fn test_identity_wire_format() {
        let identity: ServiceIdentity =
            serde_json::from_value(serde_json::json!({"serviceId": "MCP-Server", "instanceId": 7}))
                .unwrap();
        assert_eq!(identity.service_id.as_str(), "MCP-Server");
        assert_eq!(identity.instance_id, 7);
        assert_eq!(identity.to_string(), "MCP-Server/7");
    }
}
