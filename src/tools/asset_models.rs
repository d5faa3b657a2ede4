//! Asset model tools: the platform's asset-type catalogue.

use async_trait::async_trait;
use serde_json::Value;

use super::catalog::{Operation, OperationHandler, ParamDef, ParamType};
use super::str_arg;
use crate::platform::Platform;
use crate::types::Result;

#[derive(Debug)]
struct GetAllTypes;

#[async_trait]
impl OperationHandler for GetAllTypes {
    async fn invoke(&self, platform: &dyn Platform, _args: Value) -> Result<Value> {
        let infos = platform.asset_infos().await?;
        Ok(serde_json::to_value(infos)?)
    }
}

#[derive(Debug)]
struct GetType;

#[async_trait]
impl OperationHandler for GetType {
    async fn invoke(&self, platform: &dyn Platform, args: Value) -> Result<Value> {
        let asset_type = str_arg(&args, "asset_type")?;
        let info = platform.asset_info(&asset_type).await?;
        Ok(serde_json::to_value(info)?)
    }
}

pub fn operations() -> Vec<Operation> {
    vec![
        Operation::new(
            "get_all_types",
            "Retrieve a list of all asset types with their attribute descriptors.",
            vec![],
            GetAllTypes,
        ),
        Operation::new(
            "get_type",
            "Retrieve a single asset type with its attribute descriptors.",
            vec![ParamDef::required(
                "asset_type",
                ParamType::String,
                "Asset type name, e.g. 'ThingAsset'.",
            )],
            GetType,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AssetTypeInfo, MockPlatform};
    use serde_json::json;

    fn room_info() -> AssetTypeInfo {
        serde_json::from_value(json!({
            "assetDescriptor": {"name": "Room", "icon": "door"},
            "attributeDescriptors": [{"name": "temp", "type": "number"}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_all_types_keeps_unknown_fields() {
        let mut platform = MockPlatform::new();
        platform
            .expect_asset_infos()
            .times(1)
            .returning(|| Ok(vec![room_info()]));

        let ops = operations();
        let result = ops[0].invoke(&platform, json!({})).await.unwrap();
        assert_eq!(result[0]["assetDescriptor"]["name"], "Room");
        assert_eq!(result[0]["assetDescriptor"]["icon"], "door");
        assert_eq!(result[0]["attributeDescriptors"][0]["type"], "number");
    }

    #[tokio::test]
    async fn test_get_type_passes_name() {
        let mut platform = MockPlatform::new();
        platform
            .expect_asset_info()
            .withf(|name| name == "Room")
            .returning(|_| Ok(room_info()));

        let ops = operations();
        let result = ops[1]
            .invoke(&platform, json!({"asset_type": "Room"}))
            .await
            .unwrap();
        assert_eq!(result["assetDescriptor"]["name"], "Room");
    }

    #[tokio::test]
    async fn test_get_type_requires_name() {
        let platform = MockPlatform::new();
        let ops = operations();
        assert!(ops[1].invoke(&platform, json!({})).await.is_err());
    }
}
