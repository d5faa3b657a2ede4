//! Tool compiler: specializes the generic create operation per asset type.

use serde_json::Value;

use super::catalog::{Operation, ParamDef, ParamType};
use super::schema::CompiledSchema;
use crate::platform::Platform;
use crate::types::{Error, Result};

/// Parameter of the generic create operation that gets narrowed.
pub const ATTRIBUTES_PARAM: &str = "attributes";

/// Create operation specialized to one asset type.
///
/// Built once during the registration pass and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CompiledTool {
    pub name: String,
    pub description: String,
    pub input_schema: CompiledSchema,
    bound_operation: Operation,
}

impl CompiledTool {
    /// The generic operation this tool dispatches to.
    pub fn bound_operation(&self) -> &Operation {
        &self.bound_operation
    }

    /// Generic signature with `attributes` narrowed to the compiled schema.
    pub fn parameters(&self) -> Vec<ParamDef> {
        self.bound_operation
            .parameters
            .iter()
            .map(|param| {
                if param.name == ATTRIBUTES_PARAM {
                    ParamDef {
                        name: param.name.clone(),
                        param_type: ParamType::Record(Box::new(self.input_schema.clone())),
                        description: "Attributes of the asset to create.".to_string(),
                        default: None,
                    }
                } else {
                    param.clone()
                }
            })
            .collect()
    }

    pub fn to_operation(&self) -> Operation {
        self.bound_operation
            .rebind(self.name.clone(), self.description.clone(), self.parameters())
    }

    pub async fn invoke(&self, platform: &dyn Platform, args: Value) -> Result<Value> {
        self.to_operation().invoke(platform, args).await
    }
}

impl From<CompiledTool> for Operation {
    fn from(tool: CompiledTool) -> Self {
        tool.to_operation()
    }
}

/// Specialize `generic_create` to one asset type.
///
/// Pure construction; publishing the tool is the caller's job.
pub fn specialize(
    generic_create: &Operation,
    asset_type_name: &str,
    schema: CompiledSchema,
) -> Result<CompiledTool> {
    if generic_create.parameter(ATTRIBUTES_PARAM).is_none() {
        return Err(Error::validation(format!(
            "Operation '{}' has no '{}' parameter to specialize",
            generic_create.name, ATTRIBUTES_PARAM
        )));
    }

    Ok(CompiledTool {
        name: format!("create_{}", asset_type_name),
        description: format!(
            "Create a new '{}' in the OpenRemote platform.",
            asset_type_name
        ),
        input_schema: schema,
        bound_operation: generic_create.clone(),
    })
}
