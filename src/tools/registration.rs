//! Capability registration pass.
//!
//! One catalogue fetch, then compile and specialize every asset type in
//! catalogue order. A bad entry costs only its own tool; a failed fetch
//! aborts the pass.

use serde::Serialize;

use super::catalog::Operation;
use super::compiler::{specialize, CompiledTool};
use super::schema::compile;
use crate::platform::Platform;
use crate::types::Result;

/// Asset type that could not be turned into a tool.
#[derive(Debug, Clone, Serialize)]
pub struct CompileFailure {
    pub asset_type: String,
    pub error: String,
}

/// Outcome of one registration pass.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Compiled tools in catalogue order.
    pub tools: Vec<CompiledTool>,
    pub failures: Vec<CompileFailure>,
}

impl RegistrationReport {
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Run the pass against `platform`, specializing `generic_create` per asset type.
pub async fn run(platform: &dyn Platform, generic_create: &Operation) -> Result<RegistrationReport> {
    let catalogue = platform.asset_infos().await.map_err(|e| {
        tracing::error!(
            "catalogue_fetch_failed: category={}, error={}",
            e.remote_failure(),
            e
        );
        e
    })?;

    let mut report = RegistrationReport::default();

    for info in &catalogue {
        let descriptor = info.to_descriptor();
        let compiled = compile(&descriptor)
            .and_then(|schema| specialize(generic_create, &descriptor.name, schema));

        match compiled {
            Ok(tool) => report.tools.push(tool),
            Err(e) => {
                tracing::warn!(
                    "asset_type_skipped: asset_type={}, error={}",
                    descriptor.name,
                    e
                );
                report.failures.push(CompileFailure {
                    asset_type: descriptor.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "asset_types_compiled: compiled={}, skipped={}",
        report.tools.len(),
        report.failures.len()
    );

    if report.tools.is_empty() && !catalogue.is_empty() {
        tracing::warn!("no_asset_type_compiled: catalogue_size={}", catalogue.len());
    }

    Ok(report)
}

/// Render skipped asset types for a single summary message.
pub fn summarize_failures(failures: &[CompileFailure]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    let detail = failures
        .iter()
        .map(|f| format!("{}: {}", f.asset_type, f.error))
        .collect::<Vec<_>>()
        .join("; ");
    Some(format!("{} asset type(s) skipped: {}", failures.len(), detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AssetTypeInfo, MockPlatform};
    use crate::tools::assets;
    use crate::types::Error;
    use proptest::prelude::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn info(name: &str, attributes: serde_json::Value) -> AssetTypeInfo {
        serde_json::from_value(json!({
            "assetDescriptor": {"name": name},
            "attributeDescriptors": attributes,
        }))
        .unwrap()
    }

    fn catalogue() -> Vec<AssetTypeInfo> {
        vec![
            info(
                "Room",
                json!([{"name": "temp", "type": "number", "constraints": [
                    {"type": "min", "min": -50}, {"type": "max", "max": 100}
                ]}]),
            ),
            info("Flux", json!([{"name": "flux", "type": "quantumFlux"}])),
            info("Light", json!([{"name": "on", "type": "boolean", "optional": true}])),
        ]
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unknown_tag_skips_only_that_type() {
        let mut platform = MockPlatform::new();
        platform
            .expect_asset_infos()
            .times(1)
            .returning(|| Ok(catalogue()));

        let report = run(&platform, &assets::create_operation()).await.unwrap();

        assert_eq!(report.tool_names(), vec!["create_Room", "create_Light"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].asset_type, "Flux");
        assert!(report.failures[0].error.contains("quantumFlux"));
        assert!(logs_contain("asset_type_skipped"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let mut platform = MockPlatform::new();
        platform
            .expect_asset_infos()
            .returning(|| Err(Error::authentication("invalid client")));

        let err = run(&platform, &assets::create_operation()).await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[tokio::test]
    async fn test_empty_catalogue_yields_no_tools() {
        let mut platform = MockPlatform::new();
        platform.expect_asset_infos().returning(|| Ok(vec![]));

        let report = run(&platform, &assets::create_operation()).await.unwrap();
        assert!(report.tools.is_empty());
        assert!(summarize_failures(&report.failures).is_none());
    }

    #[tokio::test]
    async fn test_compiled_room_tool_enforces_bounds() {
        let mut platform = MockPlatform::new();
        platform.expect_asset_infos().returning(|| Ok(catalogue()));

        let report = run(&platform, &assets::create_operation()).await.unwrap();
        let room = report.tools[0].to_operation();

        assert!(room
            .validate_params(&json!({"name": "r", "attributes": {"temp": 21.5}}))
            .unwrap()
            .is_empty());
        assert!(!room
            .validate_params(&json!({"name": "r", "attributes": {"temp": 150}}))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_summarize_failures() {
        let summary = summarize_failures(&[CompileFailure {
            asset_type: "Flux".to_string(),
            error: "unknown type tag".to_string(),
        }])
        .unwrap();
        assert_eq!(summary, "1 asset type(s) skipped: Flux: unknown type tag");
    }

    proptest! {
        #[test]
        fn one_bad_entry_never_hides_the_rest(good in 0usize..6, bad_at in 0usize..6) {
            let bad_at = bad_at.min(good);
            let mut entries: Vec<AssetTypeInfo> = (0..good)
                .map(|i| info(&format!("Type{}", i), json!([{"name": "v", "type": "integer"}])))
                .collect();
            entries.insert(bad_at, info("Broken", json!([{"name": "v", "type": "nope"}])));

            let mut platform = MockPlatform::new();
            platform.expect_asset_infos().returning(move || Ok(entries.clone()));

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let report = runtime
                .block_on(run(&platform, &assets::create_operation()))
                .unwrap();

            prop_assert_eq!(report.tools.len(), good);
            prop_assert_eq!(report.failures.len(), 1);
            let expected: Vec<String> = (0..good).map(|i| format!("create_Type{}", i)).collect();
            prop_assert_eq!(report.tool_names(), expected);
        }
    }
}
