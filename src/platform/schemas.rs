//! Wire types of the OpenRemote manager REST API.
//!
//! Only the fields the facade reads are typed; everything else is carried in
//! `extra` so pass-through tools hand the agent what the platform sent.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tools::schema::{AssetTypeDescriptor, AttributeDescriptor, Constraint, ConstraintKind};

// =============================================================================
// External service registration
// =============================================================================

/// Advertised status of an external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Available,
    Unavailable,
}

/// Body of the service-registration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalServiceDescriptor {
    pub service_id: String,
    pub label: String,
    pub homepage_url: String,
    pub status: ServiceStatus,
}

impl ExternalServiceDescriptor {
    pub fn available(
        service_id: impl Into<String>,
        label: impl Into<String>,
        homepage_url: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            label: label.into(),
            homepage_url: homepage_url.into(),
            status: ServiceStatus::Available,
        }
    }
}

// =============================================================================
// Asset model (catalogue)
// =============================================================================

/// One entry of `GET model/assetInfos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTypeInfo {
    pub asset_descriptor: AssetDescriptorInfo,
    #[serde(default)]
    pub attribute_descriptors: Vec<AttributeDescriptorInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDescriptorInfo {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDescriptorInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub constraints: Vec<ConstraintInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Value constraint as the platform describes it (`{"type": "min", "min": 0}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintInfo {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConstraintInfo {
    fn to_constraint(&self) -> Option<Constraint> {
        match (self.kind.as_str(), self.min, self.max) {
            ("min", Some(bound), _) => Some(Constraint {
                kind: ConstraintKind::Min,
                bound,
            }),
            ("max", _, Some(bound)) => Some(Constraint {
                kind: ConstraintKind::Max,
                bound,
            }),
            _ => None,
        }
    }
}

impl AssetTypeInfo {
    /// Asset type name as declared by the platform.
    pub fn name(&self) -> &str {
        &self.asset_descriptor.name
    }

    /// Reduce to the descriptor the schema compiler consumes. Attribute order is kept.
    pub fn to_descriptor(&self) -> AssetTypeDescriptor {
        let attributes = self
            .attribute_descriptors
            .iter()
            .map(|attr| {
                let constraints = attr
                    .constraints
                    .iter()
                    .filter_map(|c| {
                        let converted = c.to_constraint();
                        if converted.is_none() {
                            tracing::debug!(
                                "constraint_ignored: asset_type={}, attribute={}, kind={}",
                                self.name(),
                                attr.name,
                                c.kind
                            );
                        }
                        converted
                    })
                    .collect();

                AttributeDescriptor {
                    name: attr.name.clone(),
                    type_tag: attr.type_tag.clone(),
                    optional: attr.optional,
                    constraints,
                }
            })
            .collect();

        AssetTypeDescriptor {
            name: self.name().to_string(),
            attributes,
        }
    }
}

// =============================================================================
// Assets
// =============================================================================

/// Body of `POST asset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetObject {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    pub attributes: Map<String, Value>,
}

/// Realm filter of an asset query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RealmPredicate {
    /// Realm name.
    pub name: String,
}

/// Body of `POST asset/query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetQuery {
    /// Asset IDs to fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,

    /// Asset types to query (use the 'asset_model_get_all_types' tool to see which types exist).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,

    /// Realm to query (use the 'realm_get_all' tool to see which realms exist).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<RealmPredicate>,

    /// Maximum number of assets to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn room_info() -> AssetTypeInfo {
        serde_json::from_value(json!({
            "assetDescriptor": {"name": "Room", "icon": "door", "colour": "2eaaff"},
            "attributeDescriptors": [
                {"name": "temp", "type": "number", "optional": false, "constraints": [
                    {"type": "min", "min": -50},
                    {"type": "pattern", "regexp": ".*"},
                    {"type": "max", "max": 100}
                ]},
                {"name": "notes", "type": "text", "optional": true}
            ],
            "valueDescriptors": ["number", "text"]
        }))
        .unwrap()
    }

    #[test]
    fn test_descriptor_conversion_keeps_order_and_min_max() {
        let descriptor = room_info().to_descriptor();
        assert_eq!(descriptor.name, "Room");
        let names: Vec<&str> = descriptor.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["temp", "notes"]);

        let temp = &descriptor.attributes[0];
        assert_eq!(temp.type_tag, "number");
        assert_eq!(
            temp.constraints,
            vec![
                Constraint { kind: ConstraintKind::Min, bound: -50.0 },
                Constraint { kind: ConstraintKind::Max, bound: 100.0 },
            ]
        );
        assert!(descriptor.attributes[1].optional);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let value = serde_json::to_value(room_info()).unwrap();
        assert_eq!(value["assetDescriptor"]["icon"], "door");
        assert_eq!(value["valueDescriptors"], json!(["number", "text"]));
        assert_eq!(
            value["attributeDescriptors"][0]["constraints"][1]["regexp"],
            ".*"
        );
    }

    #[test]
    fn test_service_descriptor_wire_format() {
        let descriptor =
            ExternalServiceDescriptor::available("MCP-Server", "MCP Server", "http://localhost:8420");
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({
                "serviceId": "MCP-Server",
                "label": "MCP Server",
                "homepageUrl": "http://localhost:8420",
                "status": "AVAILABLE",
            })
        );
    }

    #[test]
    fn test_asset_object_omits_absent_fields() {
        let asset = AssetObject {
            name: "Kitchen".to_string(),
            asset_type: Some("Room".to_string()),
            parent_id: None,
            realm: None,
            attributes: Map::new(),
        };
        assert_eq!(
            serde_json::to_value(&asset).unwrap(),
            json!({"name": "Kitchen", "type": "Room", "attributes": {}})
        );
    }
}
