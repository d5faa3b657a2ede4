//! Schema compiler: asset-type descriptors to data-driven record validators.
//!
//! Each asset type becomes a `CompiledSchema`: an ordered field list where
//! every field carries its value type, optionality and inclusive bounds.
//! Tool invocations walk this structure to validate the `attributes` argument;
//! nothing is registered globally, so compiling a descriptor twice yields the
//! same schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::type_tags::{self, value_type_name, ValueType};
use crate::types::{Error, Result};

// =============================================================================
// Descriptors (input)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    Min,
    Max,
}

/// Inclusive numeric bound on an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub bound: f64,
}

/// One data field of an asset type, as declared by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub type_tag: String,
    pub optional: bool,
    pub constraints: Vec<Constraint>,
}

/// A named asset type and its attributes, in platform order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetTypeDescriptor {
    pub name: String,
    pub attributes: Vec<AttributeDescriptor>,
}

// =============================================================================
// Compiled schema (output)
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Bounds {
    fn check(&self, n: f64) -> std::result::Result<(), String> {
        if let Some(min) = self.min {
            if n < min {
                return Err(format!("{} is less than the minimum of {}", n, min));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(format!("{} is greater than the maximum of {}", n, max));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub type_tag: String,
    pub value_type: ValueType,
    pub required: bool,
    /// Optional fields accept `null` and default to it.
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub bounds: Bounds,
}

impl FieldSpec {
    /// Validate one present value.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        if value.is_null() {
            return if self.nullable {
                Ok(())
            } else {
                Err("expected a value, got null".to_string())
            };
        }

        self.value_type.validate(value)?;

        if self.value_type.is_numeric() {
            if let Some(n) = value.as_f64() {
                self.bounds.check(n)?;
            }
        }
        Ok(())
    }

    pub fn json_schema(&self) -> Value {
        let mut inner = self.value_type.json_schema();
        if let Some(obj) = inner.as_object_mut() {
            if let Some(min) = self.bounds.min {
                obj.insert("minimum".to_string(), serde_json::json!(min));
            }
            if let Some(max) = self.bounds.max {
                obj.insert("maximum".to_string(), serde_json::json!(max));
            }
        }

        if !self.nullable {
            return inner;
        }

        let mut schema = Map::new();
        schema.insert(
            "anyOf".to_string(),
            serde_json::json!([inner, {"type": "null"}]),
        );
        schema.insert(
            "default".to_string(),
            self.default.clone().unwrap_or(Value::Null),
        );
        Value::Object(schema)
    }
}

/// Named record type derived from one asset type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    /// Constraints dropped during compilation, one message each.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CompiledSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Validate an attributes object against the schema.
    ///
    /// Returns a list of validation errors (empty = valid).
    pub fn validate(&self, value: &Value) -> Vec<String> {
        let Some(map) = value.as_object() else {
            return vec![format!(
                "Attributes must be a JSON object, got {}",
                value_type_name(value)
            )];
        };

        let mut errors = Vec::new();

        for field in &self.fields {
            match map.get(&field.name) {
                None if field.required => {
                    errors.push(format!("Missing required attribute: {}", field.name));
                }
                None => {}
                Some(v) => {
                    if let Err(e) = field.validate(v) {
                        errors.push(format!("Attribute '{}': {}", field.name, e));
                    }
                }
            }
        }

        for key in map.keys() {
            if self.field(key).is_none() {
                errors.push(format!("Unknown attribute: {}", key));
            }
        }

        errors
    }

    /// Fill `null` for absent optional fields.
    pub fn fill_defaults(&self, value: &mut Value) {
        if let Some(map) = value.as_object_mut() {
            for field in &self.fields {
                if !map.contains_key(&field.name) {
                    if let Some(default) = &field.default {
                        map.insert(field.name.clone(), default.clone());
                    }
                }
            }
        }
    }

    /// JSON Schema object with properties in declaration order.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), field.json_schema());
            if field.required {
                required.push(Value::String(field.name.clone()));
            }
        }

        serde_json::json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Compile one asset-type descriptor.
///
/// Fails with `UnknownTypeTag` (or `Validation` on duplicate attribute names);
/// the failure concerns this asset type only.
pub fn compile(descriptor: &AssetTypeDescriptor) -> Result<CompiledSchema> {
    let mut fields = Vec::with_capacity(descriptor.attributes.len());
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for attribute in &descriptor.attributes {
        if !seen.insert(attribute.name.as_str()) {
            return Err(Error::validation(format!(
                "Duplicate attribute '{}' in asset type '{}'",
                attribute.name, descriptor.name
            )));
        }

        let spec = type_tags::resolve(&attribute.type_tag, &attribute.name)?;

        let mut bounds = Bounds {
            min: spec.default_min,
            max: None,
        };

        for constraint in &attribute.constraints {
            if !spec.value_type.is_numeric() {
                let warning = format!(
                    "Ignored {:?} constraint on non-numeric attribute '{}' ({})",
                    constraint.kind, attribute.name, attribute.type_tag
                );
                tracing::warn!(
                    "constraint_skipped: asset_type={}, attribute={}, type_tag={}, kind={:?}",
                    descriptor.name,
                    attribute.name,
                    attribute.type_tag,
                    constraint.kind
                );
                warnings.push(warning);
                continue;
            }

            // Later constraints of the same kind override earlier ones.
            match constraint.kind {
                ConstraintKind::Min => bounds.min = Some(constraint.bound),
                ConstraintKind::Max => bounds.max = Some(constraint.bound),
            }
        }

        fields.push(FieldSpec {
            name: attribute.name.clone(),
            type_tag: attribute.type_tag.clone(),
            value_type: spec.value_type,
            required: !attribute.optional,
            nullable: attribute.optional,
            default: attribute.optional.then_some(Value::Null),
            bounds,
        });
    }

    Ok(CompiledSchema {
        name: descriptor.name.clone(),
        fields,
        warnings,
    })
}
