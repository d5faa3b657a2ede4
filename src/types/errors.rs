//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a remote call went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteFailure {
    /// Host unreachable, connection reset, TLS failure, undecodable body.
    Network,
    /// Client-credentials exchange refused, or the platform answered 401/403.
    Authentication,
    /// The platform answered, but with a non-success status.
    Rejected,
    /// Anything that did not originate from the remote call itself.
    Other,
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemoteFailure::Network => "network",
            RemoteFailure::Authentication => "authentication",
            RemoteFailure::Rejected => "platform rejection",
            RemoteFailure::Other => "other",
        };
        f.write_str(s)
    }
}

/// Main error enum for the OpenRemote tool facade.
#[derive(Error, Debug)]
pub enum Error {
    /// Attribute type tag with no entry in the type tag registry.
    #[error("unknown type tag '{tag}' on attribute '{attribute}'")]
    UnknownTypeTag { tag: String, attribute: String },

    /// Service registration against the platform failed (fatal at startup).
    #[error("service registration failed ({category}): {message}")]
    RegistrationFailed {
        category: RemoteFailure,
        message: String,
    },

    /// Lifecycle accessor used outside the REGISTERED state.
    #[error("service not initialized: {0}")]
    NotInitialized(String),

    /// A single liveness signal could not be delivered.
    #[error("heartbeat failed: {0}")]
    HeartbeatFailed(String),

    /// Invalid lifecycle state transition.
    #[error("state transition error: {0}")]
    StateTransition(String),

    /// Validation errors (bad tool arguments, bad descriptors, bad config).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Token exchange with the platform's identity provider failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The platform answered with a non-success HTTP status.
    #[error("platform returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),

    /// HTTP transport errors.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify an error by where the remote call failed.
    pub fn remote_failure(&self) -> RemoteFailure {
        match self {
            Error::Http(e) if e.status().map_or(false, |s| s.as_u16() == 401 || s.as_u16() == 403) => {
                RemoteFailure::Authentication
            }
            Error::Http(e) if e.status().is_some() => RemoteFailure::Rejected,
            Error::Http(_) => RemoteFailure::Network,
            Error::Authentication(_) => RemoteFailure::Authentication,
            Error::Status { status, .. } if *status == 401 || *status == 403 => {
                RemoteFailure::Authentication
            }
            Error::Status { .. } => RemoteFailure::Rejected,
            Error::Serialization(_) => RemoteFailure::Network,
            Error::RegistrationFailed { category, .. } => *category,
            _ => RemoteFailure::Other,
        }
    }

    /// JSON-RPC error code for the MCP host.
    pub fn to_rpc_code(&self) -> i64 {
        match self {
            Error::Validation(_) | Error::UnknownTypeTag { .. } => -32602,
            Error::NotFound(_) => -32601,
            Error::NotInitialized(_) | Error::StateTransition(_) => -32002,
            _ => -32603,
        }
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn not_initialized(msg: impl Into<String>) -> Self {
        Self::NotInitialized(msg.into())
    }

    pub fn state_transition(msg: impl Into<String>) -> Self {
        Self::StateTransition(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn unknown_type_tag(tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::UnknownTypeTag {
            tag: tag.into(),
            attribute: attribute.into(),
        }
    }

    /// Collapse any remote failure into the unified registration error.
    pub fn registration_failed(source: &Error) -> Self {
        Self::RegistrationFailed {
            category: source.remote_failure(),
            message: source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let auth = Error::Status {
            status: 401,
            body: "denied".to_string(),
        };
        assert_eq!(auth.remote_failure(), RemoteFailure::Authentication);

        let rejected = Error::Status {
            status: 409,
            body: "duplicate".to_string(),
        };
        assert_eq!(rejected.remote_failure(), RemoteFailure::Rejected);

        assert_eq!(
            Error::authentication("bad secret").remote_failure(),
            RemoteFailure::Authentication
        );
        assert_eq!(Error::internal("x").remote_failure(), RemoteFailure::Other);
    }

    #[test]
    fn test_registration_failed_keeps_category_and_detail() {
        let source = Error::Status {
            status: 400,
            body: "invalid serviceId".to_string(),
        };
        let err = Error::registration_failed(&source);
        match &err {
            Error::RegistrationFailed { category, message } => {
                assert_eq!(*category, RemoteFailure::Rejected);
                assert!(message.contains("invalid serviceId"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("platform rejection"));
    }

    #[test]
    fn test_rpc_codes() {
        assert_eq!(Error::validation("x").to_rpc_code(), -32602);
        assert_eq!(Error::not_found("x").to_rpc_code(), -32601);
        assert_eq!(Error::not_initialized("x").to_rpc_code(), -32002);
        assert_eq!(Error::internal("x").to_rpc_code(), -32603);
    }
}
