//! Tool catalog: typed parameters, operations, and the published tool registry.
//!
//! An `Operation` is a named, described, parameter-typed callable bound to a
//! handler. The registry holds the operations exposed to the calling agent in
//! registration order and validates arguments before dispatching.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::schema::CompiledSchema;
use super::type_tags::expect;
use crate::platform::Platform;
use crate::types::{Error, Result};

// =============================================================================
// Parameter types
// =============================================================================

/// Parameter type for tool inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    /// String, number or boolean.
    Scalar,
    Optional(Box<ParamType>),
    /// Unconstrained JSON object.
    Object,
    /// JSON object described by a generated schema; the handler deserializes it.
    Structured(Value),
    /// JSON object validated field-by-field against a compiled asset schema.
    Record(Box<CompiledSchema>),
}

impl ParamType {
    /// Validate a JSON value against this parameter type.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            ParamType::String => expect(value.is_string(), "string", value),
            ParamType::Scalar => expect(
                value.is_string() || value.is_number() || value.is_boolean(),
                "string, number or boolean",
                value,
            ),
            ParamType::Optional(inner) => {
                if value.is_null() {
                    Ok(())
                } else {
                    inner.validate(value)
                }
            }
            ParamType::Object | ParamType::Structured(_) => {
                expect(value.is_object(), "object", value)
            }
            ParamType::Record(schema) => {
                let errors = schema.validate(value);
                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(errors.join("; "))
                }
            }
        }
    }

    /// JSON Schema fragment presented to the calling agent.
    pub fn json_schema(&self) -> Value {
        match self {
            ParamType::String => serde_json::json!({"type": "string"}),
            ParamType::Scalar => serde_json::json!({"type": ["string", "number", "boolean"]}),
            ParamType::Optional(inner) => {
                serde_json::json!({"anyOf": [inner.json_schema(), {"type": "null"}]})
            }
            ParamType::Object => serde_json::json!({"type": "object"}),
            ParamType::Structured(schema) => schema.clone(),
            ParamType::Record(schema) => schema.json_schema(),
        }
    }
}

// =============================================================================
// Parameter definition
// =============================================================================

/// A single parameter definition for a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamDef {
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            default: None,
        }
    }

    /// Nullable parameter defaulting to `null`.
    pub fn optional(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type: ParamType::Optional(Box::new(param_type)),
            description: description.to_string(),
            default: Some(Value::Null),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none() && !matches!(self.param_type, ParamType::Optional(_))
    }

    fn json_schema(&self) -> Value {
        let mut schema = self.param_type.json_schema();
        if let Some(obj) = schema.as_object_mut() {
            if !self.description.is_empty() {
                obj.insert(
                    "description".to_string(),
                    Value::String(self.description.clone()),
                );
            }
            if let Some(default) = &self.default {
                obj.insert("default".to_string(), default.clone());
            }
        }
        schema
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Implementation behind an operation. Borrows the platform connection per call.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn invoke(&self, platform: &dyn Platform, args: Value) -> Result<Value>;
}

/// A callable tool: metadata, parameter signature and bound handler.
#[derive(Clone)]
pub struct Operation {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamDef>,
    handler: Arc<dyn OperationHandler>,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl Operation {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParamDef>,
        handler: impl OperationHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(handler),
        }
    }

    /// Same handler under a different name and signature.
    pub(crate) fn rebind(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParamDef>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::clone(&self.handler),
        }
    }

    /// Whether both operations dispatch to the same handler instance.
    pub fn shares_handler_with(&self, other: &Operation) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.handler) as *const (),
            Arc::as_ptr(&other.handler) as *const (),
        )
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamDef> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Validate arguments against the parameter definitions.
    ///
    /// Returns a list of validation errors (empty = valid).
    pub fn validate_params(&self, params: &Value) -> Result<Vec<String>> {
        let param_map = params
            .as_object()
            .ok_or_else(|| Error::validation("Parameters must be a JSON object"))?;

        let mut errors = Vec::new();

        // Check required parameters are present
        for param_def in &self.parameters {
            if param_def.is_required() && !param_map.contains_key(&param_def.name) {
                errors.push(format!("Missing required parameter: {}", param_def.name));
            }
        }

        let known_names: HashMap<&str, &ParamDef> = self
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p))
            .collect();

        for (key, value) in param_map {
            if let Some(param_def) = known_names.get(key.as_str()) {
                if let Err(e) = param_def.param_type.validate(value) {
                    errors.push(format!("Parameter '{}': {}", key, e));
                }
            } else {
                errors.push(format!("Unknown parameter: {}", key));
            }
        }

        Ok(errors)
    }

    /// Fill in default values for missing optional parameters, including
    /// nullable fields of compiled records.
    pub fn fill_defaults(&self, params: &mut Value) {
        if let Some(map) = params.as_object_mut() {
            for param_def in &self.parameters {
                match map.get_mut(&param_def.name) {
                    Some(value) => {
                        if let ParamType::Record(schema) = &param_def.param_type {
                            schema.fill_defaults(value);
                        }
                    }
                    None => {
                        if let Some(default) = &param_def.default {
                            map.insert(param_def.name.clone(), default.clone());
                        }
                    }
                }
            }
        }
    }

    /// JSON Schema of the whole argument object, parameters in declaration order.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            properties.insert(param.name.clone(), param.json_schema());
            if param.is_required() {
                required.push(Value::String(param.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate, fill defaults and dispatch to the handler.
    pub async fn invoke(&self, platform: &dyn Platform, mut args: Value) -> Result<Value> {
        if args.is_null() {
            args = Value::Object(Map::new());
        }

        let errors = self.validate_params(&args)?;
        if !errors.is_empty() {
            return Err(Error::validation(format!(
                "Invalid arguments for '{}': {}",
                self.name,
                errors.join("; ")
            )));
        }

        self.fill_defaults(&mut args);
        self.handler.invoke(platform, args).await
    }

    /// MCP tool listing entry.
    pub fn to_definition(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

// =============================================================================
// Tool registry
// =============================================================================

/// Published tool set. Keeps registration order for presentation.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<Operation>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn add_tool(&mut self, tool: impl Into<Operation>) -> Result<()> {
        let tool = tool.into();
        if tool.name.is_empty() {
            return Err(Error::validation("Tool name cannot be empty"));
        }

        match self.index.get(&tool.name) {
            Some(&slot) => {
                tracing::debug!("tool_replaced: name={}", tool.name);
                self.tools[slot] = tool;
            }
            None => {
                self.index.insert(tool.name.clone(), self.tools.len());
                self.tools.push(tool);
            }
        }
        Ok(())
    }

    /// Register a group of tools as `{prefix}_{name}`.
    pub fn import_tools<I, T>(&mut self, tools: I, prefix: &str) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
        T: Into<Operation>,
    {
        let mut count = 0;
        for tool in tools {
            let mut tool = tool.into();
            if !prefix.is_empty() {
                tool.name = format!("{}_{}", prefix, tool.name);
            }
            self.add_tool(tool)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.index.get(name).map(|&slot| &self.tools[slot])
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All tools in registration order.
    pub fn list(&self) -> &[Operation] {
        &self.tools
    }

    pub fn list_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// Invoke a tool by name.
    pub async fn call(&self, name: &str, platform: &dyn Platform, args: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::not_found(format!("Unknown tool: {}", name)))?;
        tool.invoke(platform, args).await
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
