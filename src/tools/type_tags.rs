//! Type tag registry: platform attribute type tags to value types.
//!
//! The table is static; an unknown tag is an error, never a silent fallback,
//! because a wrong value type would let invalid data through to the platform.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Error, Result};

/// Concrete value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Integer,
    Number,
    Boolean,
    StringList,
    IntegerMatrix,
}

impl ValueType {
    /// Bounds only make sense for these.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Number)
    }

    /// Check the JSON shape of a value (bounds are checked by the schema).
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            ValueType::String => expect(value.is_string(), "string", value),
            ValueType::Integer => expect(is_integer(value), "integer", value),
            ValueType::Number => expect(value.is_number(), "number", value),
            ValueType::Boolean => expect(value.is_boolean(), "boolean", value),
            ValueType::StringList => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| format!("expected array, got {}", value_type_name(value)))?;
                for (i, item) in arr.iter().enumerate() {
                    if !item.is_string() {
                        return Err(format!(
                            "expected string at index {}, got {}",
                            i,
                            value_type_name(item)
                        ));
                    }
                }
                Ok(())
            }
            ValueType::IntegerMatrix => {
                let rows = value
                    .as_array()
                    .ok_or_else(|| format!("expected array, got {}", value_type_name(value)))?;
                for (i, row) in rows.iter().enumerate() {
                    let cells = row.as_array().ok_or_else(|| {
                        format!("expected array at index {}, got {}", i, value_type_name(row))
                    })?;
                    for (j, cell) in cells.iter().enumerate() {
                        if !is_integer(cell) {
                            return Err(format!(
                                "expected integer at index [{}][{}], got {}",
                                i,
                                j,
                                value_type_name(cell)
                            ));
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// JSON Schema fragment for this type.
    pub fn json_schema(&self) -> Value {
        match self {
            ValueType::String => serde_json::json!({"type": "string"}),
            ValueType::Integer => serde_json::json!({"type": "integer"}),
            ValueType::Number => serde_json::json!({"type": "number"}),
            ValueType::Boolean => serde_json::json!({"type": "boolean"}),
            ValueType::StringList => {
                serde_json::json!({"type": "array", "items": {"type": "string"}})
            }
            ValueType::IntegerMatrix => serde_json::json!({
                "type": "array",
                "items": {"type": "array", "items": {"type": "integer"}}
            }),
        }
    }
}

/// Integral JSON number, including whole floats such as `5.0`.
pub(crate) fn is_integer(value: &Value) -> bool {
    value.is_i64()
        || value.is_u64()
        || value
            .as_f64()
            .map_or(false, |f| f.is_finite() && f.fract() == 0.0)
}

pub(crate) fn expect(ok: bool, expected: &str, value: &Value) -> std::result::Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(format!("expected {}, got {}", expected, value_type_name(value)))
    }
}

pub(crate) fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolved type tag: value type plus the validation it implies by default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueTypeSpec {
    pub value_type: ValueType,
    /// Inclusive lower bound implied by the tag (`positive*` tags).
    pub default_min: Option<f64>,
}

impl ValueTypeSpec {
    const fn plain(value_type: ValueType) -> Self {
        Self {
            value_type,
            default_min: None,
        }
    }

    const fn non_negative(value_type: ValueType) -> Self {
        Self {
            value_type,
            default_min: Some(0.0),
        }
    }
}

const TYPE_TAGS: &[(&str, ValueTypeSpec)] = &[
    ("text", ValueTypeSpec::plain(ValueType::String)),
    ("positiveInteger", ValueTypeSpec::non_negative(ValueType::Integer)),
    ("boolean", ValueTypeSpec::plain(ValueType::Boolean)),
    ("email", ValueTypeSpec::plain(ValueType::String)),
    ("text[]", ValueTypeSpec::plain(ValueType::StringList)),
    ("colourRGB", ValueTypeSpec::plain(ValueType::String)),
    ("GEO_JSONPoint", ValueTypeSpec::plain(ValueType::String)),
    ("hostOrIPAddress", ValueTypeSpec::plain(ValueType::String)),
    ("TCP_IPPortNumber", ValueTypeSpec::plain(ValueType::String)),
    ("usernameAndPassword", ValueTypeSpec::plain(ValueType::String)),
    ("connectionStatus", ValueTypeSpec::plain(ValueType::String)),
    ("oAuthGrant", ValueTypeSpec::plain(ValueType::String)),
    ("assetType", ValueTypeSpec::plain(ValueType::String)),
    ("positiveNumber", ValueTypeSpec::non_negative(ValueType::Number)),
    ("number", ValueTypeSpec::plain(ValueType::Number)),
    ("executionStatus", ValueTypeSpec::plain(ValueType::String)),
    ("positiveInteger[][]", ValueTypeSpec::plain(ValueType::IntegerMatrix)),
    ("connectorType", ValueTypeSpec::plain(ValueType::String)),
    ("multivaluedTextMap", ValueTypeSpec::plain(ValueType::String)),
    ("HTTP_URL", ValueTypeSpec::plain(ValueType::String)),
    ("integer", ValueTypeSpec::plain(ValueType::Integer)),
    ("SNMPVersion", ValueTypeSpec::plain(ValueType::String)),
    ("MQTTQos", ValueTypeSpec::plain(ValueType::String)),
    ("kNXMessageSourceAddress", ValueTypeSpec::plain(ValueType::String)),
    ("panelOrientation", ValueTypeSpec::plain(ValueType::String)),
    ("UUID", ValueTypeSpec::plain(ValueType::String)),
    ("WS_URL", ValueTypeSpec::plain(ValueType::String)),
    ("websocketSubscription", ValueTypeSpec::plain(ValueType::String)),
    ("websocketSubscription[]", ValueTypeSpec::plain(ValueType::StringList)),
    ("energyType", ValueTypeSpec::plain(ValueType::String)),
    ("operationMode", ValueTypeSpec::plain(ValueType::String)),
    ("consoleProviders", ValueTypeSpec::plain(ValueType::String)),
    ("direction", ValueTypeSpec::plain(ValueType::String)),
    ("vegetableType", ValueTypeSpec::plain(ValueType::String)),
];

/// Look up a platform type tag.
///
/// `attribute` only feeds the error message.
pub fn resolve(tag: &str, attribute: &str) -> Result<ValueTypeSpec> {
    TYPE_TAGS
        .iter()
        .find(|(known, _)| *known == tag)
        .map(|(_, spec)| *spec)
        .ok_or_else(|| Error::unknown_type_tag(tag, attribute))
}

/// All registered tags, in table order.
pub fn known_tags() -> impl Iterator<Item = &'static str> {
    TYPE_TAGS.iter().map(|(tag, _)| *tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_resolve_known_tags() {
        assert_eq!(resolve("number", "temp").unwrap().value_type, ValueType::Number);
        assert_eq!(resolve("text[]", "tags").unwrap().value_type, ValueType::StringList);
        assert_eq!(
            resolve("positiveInteger[][]", "grid").unwrap().value_type,
            ValueType::IntegerMatrix
        );
    }

    #[test]
    fn test_positive_tags_imply_lower_bound() {
        assert_eq!(resolve("positiveInteger", "n").unwrap().default_min, Some(0.0));
        assert_eq!(resolve("positiveNumber", "n").unwrap().default_min, Some(0.0));
        assert_eq!(resolve("integer", "n").unwrap().default_min, None);
    }

    #[test]
    fn test_unknown_tag_fails() {
        let err = resolve("quantumFlux", "flux").unwrap_err();
        match err {
            Error::UnknownTypeTag { tag, attribute } => {
                assert_eq!(tag, "quantumFlux");
                assert_eq!(attribute, "flux");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_tags_are_unique() {
        let mut tags: Vec<&str> = known_tags().collect();
        let total = tags.len();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), total);
    }

    #[test]
    fn test_value_type_validation() {
        assert!(ValueType::Integer.validate(&json!(3)).is_ok());
        assert!(ValueType::Integer.validate(&json!(3.5)).is_err());
        assert!(ValueType::Integer.validate(&json!(5.0)).is_ok());
        assert!(ValueType::Integer.validate(&json!(-2.0)).is_ok());
        assert!(ValueType::Number.validate(&json!(3)).is_ok());
        assert!(ValueType::Boolean.validate(&json!("true")).is_err());
        assert!(ValueType::StringList.validate(&json!(["a", "b"])).is_ok());
        assert!(ValueType::StringList.validate(&json!(["a", 1])).is_err());
        assert!(ValueType::IntegerMatrix.validate(&json!([[1, 2], [3]])).is_ok());
        assert!(ValueType::IntegerMatrix.validate(&json!([[1, "x"]])).is_err());
        assert!(ValueType::IntegerMatrix.validate(&json!([[1.0, 2]])).is_ok());
        assert!(ValueType::IntegerMatrix.validate(&json!([[1.5]])).is_err());
        assert!(ValueType::IntegerMatrix.validate(&json!([1])).is_err());
    }

    proptest! {
        #[test]
        fn resolve_is_stable(index in 0usize..TYPE_TAGS.len()) {
            let tag = TYPE_TAGS[index].0;
            let first = resolve(tag, "a").unwrap();
            let second = resolve(tag, "b").unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn unregistered_tags_never_resolve(tag in "[a-z]{1,12}_x") {
            prop_assert!(resolve(&tag, "a").is_err());
        }
    }
}
