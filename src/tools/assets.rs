//! Asset tools: query, fetch, write, and the generic create operation that the
//! tool compiler specializes per asset type.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::catalog::{Operation, OperationHandler, ParamDef, ParamType};
use super::{opt_str_arg, status_as_detail, str_arg, structured_schema};
use crate::platform::{AssetObject, AssetQuery, Platform};
use crate::types::{Error, Result};

const QUERY_DESCRIPTION: &str = "Lists all assets available.

If 403 is returned, that either means you don't have the correct access rights or the realms you specified do not exist.
Try calling the 'realm_get_all' tool to see which realms are available.";

const CREATE_DESCRIPTION: &str = "Create a new asset in the OpenRemote platform.

The field \"attributes\" is required: an object mapping each attribute name to its value.
If the user does not provide attribute values, call 'asset_model_get_all_types', find the selected type and fill in its required attributes with logical placeholders.
If OpenRemote returns 400 the attributes are wrong or incomplete: ask the user for the missing information.
Prefer the asset-type specific 'asset_create_<Type>' tools, which validate attributes before sending them.";

#[derive(Debug)]
struct QueryAssets;

#[async_trait]
impl OperationHandler for QueryAssets {
    async fn invoke(&self, platform: &dyn Platform, args: Value) -> Result<Value> {
        let raw = args
            .get("asset_query")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        let query: AssetQuery = serde_json::from_value(raw)
            .map_err(|e| Error::validation(format!("Invalid asset query: {}", e)))?;

        status_as_detail(platform.query_assets(&query).await)
    }
}

#[derive(Debug)]
struct GetAsset;

#[async_trait]
impl OperationHandler for GetAsset {
    async fn invoke(&self, platform: &dyn Platform, args: Value) -> Result<Value> {
        let asset_id = str_arg(&args, "asset_id")?;
        platform.get_asset(&asset_id).await
    }
}

#[derive(Debug)]
struct CreateAsset;

#[async_trait]
impl OperationHandler for CreateAsset {
    async fn invoke(&self, platform: &dyn Platform, args: Value) -> Result<Value> {
        let attributes = args
            .get("attributes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let asset = AssetObject {
            name: str_arg(&args, "name")?,
            asset_type: opt_str_arg(&args, "type"),
            parent_id: opt_str_arg(&args, "parentId"),
            realm: opt_str_arg(&args, "realm"),
            attributes: to_platform_attributes(attributes),
        };

        match platform.create_asset(&asset).await {
            Ok(created) => Ok(created),
            Err(Error::Status { status, body }) => Ok(serde_json::json!({
                "status_code": status,
                "detail": body,
            })),
            Err(e) => {
                tracing::warn!("asset_create_failed: name={}, error={}", asset.name, e);
                Ok(serde_json::json!({ "detail": e.to_string() }))
            }
        }
    }
}

/// Wrap bare values as `{"name": key, "value": v}`; attribute objects pass through.
fn to_platform_attributes(attributes: Map<String, Value>) -> Map<String, Value> {
    attributes
        .into_iter()
        .map(|(key, value)| {
            let is_attribute_object = value
                .as_object()
                .map_or(false, |obj| obj.contains_key("name"));
            let wrapped = if is_attribute_object {
                value
            } else {
                serde_json::json!({ "name": key, "value": value })
            };
            (key, wrapped)
        })
        .collect()
}

#[derive(Debug)]
struct WriteAttributeValue;

#[async_trait]
impl OperationHandler for WriteAttributeValue {
    async fn invoke(&self, platform: &dyn Platform, args: Value) -> Result<Value> {
        let asset_id = str_arg(&args, "asset_id")?;
        let attribute_name = str_arg(&args, "attribute_name")?;
        let value = args.get("value").cloned().unwrap_or(Value::Null);
        platform
            .write_attribute_value(&asset_id, &attribute_name, &value)
            .await
    }
}

/// The generic create operation; `attributes` is an unconstrained mapping.
pub fn create_operation() -> Operation {
    Operation::new(
        "create",
        CREATE_DESCRIPTION,
        vec![
            ParamDef::required("name", ParamType::String, "Name of the new asset."),
            ParamDef::required(
                "attributes",
                ParamType::Object,
                "Attributes of the asset to create, keyed by attribute name.",
            ),
            ParamDef::optional("type", ParamType::String, "Asset type name."),
            ParamDef::optional("parentId", ParamType::String, "ID of the parent asset."),
            ParamDef::optional("realm", ParamType::String, "Realm to create the asset in."),
        ],
        CreateAsset,
    )
}

/// Asset tools in presentation order, unprefixed.
pub fn operations() -> Vec<Operation> {
    vec![
        Operation::new(
            "query",
            QUERY_DESCRIPTION,
            vec![ParamDef::required(
                "asset_query",
                ParamType::Structured(structured_schema::<AssetQuery>()),
                "Asset query.",
            )],
            QueryAssets,
        ),
        Operation::new(
            "get_by_id",
            "Retrieve a single asset by ID.",
            vec![ParamDef::required("asset_id", ParamType::String, "Asset ID.")],
            GetAsset,
        ),
        create_operation(),
        Operation::new(
            "write_attribute_value",
            "Write/update a single attribute value on an asset. Use this to change sensor values, settings, etc.",
            vec![
                ParamDef::required("asset_id", ParamType::String, "Asset ID."),
                ParamDef::required("attribute_name", ParamType::String, "Attribute name."),
                ParamDef::required("value", ParamType::Scalar, "New attribute value."),
            ],
            WriteAttributeValue,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockPlatform;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_wraps_bare_values() {
        let mut platform = MockPlatform::new();
        platform
            .expect_create_asset()
            .withf(|asset| {
                asset.name == "Kitchen"
                    && asset.asset_type.as_deref() == Some("Room")
                    && asset.attributes["temp"] == json!({"name": "temp", "value": 21.5})
                    && asset.attributes["notes"] == json!({"name": "notes", "type": "text"})
            })
            .times(1)
            .returning(|_| Ok(json!({"id": "4xyz"})));

        let result = create_operation()
            .invoke(
                &platform,
                json!({
                    "name": "Kitchen",
                    "type": "Room",
                    "attributes": {"temp": 21.5, "notes": {"name": "notes", "type": "text"}}
                }),
            )
            .await
            .unwrap();
        assert_eq!(result, json!({"id": "4xyz"}));
    }

    #[tokio::test]
    async fn test_create_reports_http_status_as_detail() {
        let mut platform = MockPlatform::new();
        platform.expect_create_asset().returning(|_| {
            Err(Error::Status {
                status: 400,
                body: "missing attribute".to_string(),
            })
        });

        let result = create_operation()
            .invoke(&platform, json!({"name": "Kitchen", "attributes": {}}))
            .await
            .unwrap();
        assert_eq!(result, json!({"status_code": 400, "detail": "missing attribute"}));
    }

    #[tokio::test]
    async fn test_query_deserializes_structured_argument() {
        let mut platform = MockPlatform::new();
        platform
            .expect_query_assets()
            .withf(|query| {
                query.types.as_deref() == Some(&["Room".to_string()][..])
                    && query.realm.as_ref().map(|r| r.name.as_str()) == Some("smartcity")
            })
            .returning(|_| Ok(json!([])));

        let ops = operations();
        let query = ops.iter().find(|op| op.name == "query").unwrap();
        let result = query
            .invoke(
                &platform,
                json!({"asset_query": {"types": ["Room"], "realm": {"name": "smartcity"}}}),
            )
            .await
            .unwrap();
        assert_eq!(result, json!([]));
    }

    #[tokio::test]
    async fn test_query_forbidden_is_returned_not_raised() {
        let mut platform = MockPlatform::new();
        platform.expect_query_assets().returning(|_| {
            Err(Error::Status {
                status: 403,
                body: "forbidden".to_string(),
            })
        });

        let ops = operations();
        let query = ops.iter().find(|op| op.name == "query").unwrap();
        let result = query
            .invoke(&platform, json!({"asset_query": {}}))
            .await
            .unwrap();
        assert_eq!(result["status_code"], 403);
    }

    #[tokio::test]
    async fn test_write_attribute_value_forwards() {
        let mut platform = MockPlatform::new();
        platform
            .expect_write_attribute_value()
            .withf(|id, attr, value| id == "a1" && attr == "temp" && *value == json!(19))
            .returning(|_, _, _| Ok(Value::Null));

        let ops = operations();
        let write = ops
            .iter()
            .find(|op| op.name == "write_attribute_value")
            .unwrap();
        let result = write
            .invoke(
                &platform,
                json!({"asset_id": "a1", "attribute_name": "temp", "value": 19}),
            )
            .await
            .unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn test_query_schema_is_inlined() {
        let ops = operations();
        let schema = ops[0].input_schema();
        let realm = &schema["properties"]["asset_query"]["properties"]["realm"];
        assert!(realm.to_string().contains("\"name\""), "{}", realm);
        assert!(!schema.to_string().contains("$ref"));
    }
}
