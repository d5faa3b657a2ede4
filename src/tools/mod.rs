//! Agent tools backed by the OpenRemote platform.
//!
//! Type tags resolve to value types, asset-type descriptors compile into
//! record validators, and the generic create operation is specialized once
//! per asset type. Everything ends up in one `ToolRegistry`.

pub mod asset_models;
pub mod assets;
pub mod catalog;
pub mod compiler;
pub mod health;
pub mod realms;
pub mod registration;
pub mod schema;
pub mod type_tags;

use schemars::JsonSchema;
use serde_json::Value;

use crate::platform::Platform;
use crate::types::{Error, Result};

pub use catalog::{Operation, OperationHandler, ParamDef, ParamType, ToolRegistry};
pub use compiler::{specialize, CompiledTool};
pub use health::{HealthReport, HealthStatus};
pub use registration::{CompileFailure, RegistrationReport};
pub use schema::{compile, AssetTypeDescriptor, AttributeDescriptor, CompiledSchema};
pub use type_tags::{ValueType, ValueTypeSpec};

/// Build the full tool set: pass-through tools plus one create tool per
/// compilable asset type. Fails only if the catalogue cannot be fetched.
pub async fn init_tools(platform: &dyn Platform) -> Result<(ToolRegistry, RegistrationReport)> {
    let generic_create = assets::create_operation();
    let report = registration::run(platform, &generic_create).await?;

    let mut registry = ToolRegistry::new();
    registry.import_tools(assets::operations(), "asset")?;
    registry.import_tools(report.tools.iter().cloned(), "asset")?;
    registry.import_tools(asset_models::operations(), "asset_model")?;
    registry.import_tools(realms::operations(), "realm")?;

    tracing::info!(
        "tools_initialized: tools={}, asset_types={}, skipped={}",
        registry.len(),
        report.tools.len(),
        report.failures.len()
    );

    Ok((registry, report))
}

pub(crate) fn str_arg(args: &Value, name: &str) -> Result<String> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::validation(format!("Missing string argument: {}", name)))
}

pub(crate) fn opt_str_arg(args: &Value, name: &str) -> Option<String> {
    args.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Turn a platform HTTP error into a `{status_code, detail}` result.
pub(crate) fn status_as_detail(result: Result<Value>) -> Result<Value> {
    match result {
        Err(Error::Status { status, body }) => Ok(serde_json::json!({
            "status_code": status,
            "detail": body,
        })),
        other => other,
    }
}

/// Inlined JSON Schema for a structured argument type.
pub(crate) fn structured_schema<T: JsonSchema>() -> Value {
    let generator = schemars::gen::SchemaSettings::draft07()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.meta_schema = None;
        })
        .into_generator();
    let root = generator.into_root_schema_for::<T>();
    serde_json::to_value(root).unwrap_or_else(|e| {
        tracing::error!("schema_generation_failed: error={}", e);
        serde_json::json!({"type": "object"})
    })
}
