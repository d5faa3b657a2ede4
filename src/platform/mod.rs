//! Remote platform boundary: the OpenRemote manager REST API.
//!
//! `Platform` is the seam every caller goes through: the lifecycle manager
//! (register, heartbeat, deregister), the capability registration pass
//! (catalogue fetch), the tools and the health check. `PlatformClient` is the
//! reqwest-backed implementation; tests substitute a mock.

pub mod client;
pub mod schemas;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Result, ServiceIdentity};

pub use client::PlatformClient;
pub use schemas::{AssetObject, AssetQuery, AssetTypeInfo, ExternalServiceDescriptor, ServiceStatus};

/// Authenticated connection to the remote platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Platform: Send + Sync {
    /// Register this facade as an external service.
    async fn register_service(
        &self,
        descriptor: &ExternalServiceDescriptor,
    ) -> Result<ServiceIdentity>;

    /// Send one liveness signal for a registered instance.
    async fn heartbeat(&self, identity: &ServiceIdentity) -> Result<()>;

    /// Remove a registered instance.
    async fn deregister_service(&self, identity: &ServiceIdentity) -> Result<()>;

    /// Fetch the full asset-type catalogue.
    async fn asset_infos(&self) -> Result<Vec<AssetTypeInfo>>;

    /// Fetch one asset type.
    async fn asset_info(&self, asset_type: &str) -> Result<AssetTypeInfo>;

    async fn query_assets(&self, query: &AssetQuery) -> Result<Value>;

    async fn get_asset(&self, asset_id: &str) -> Result<Value>;

    async fn create_asset(&self, asset: &AssetObject) -> Result<Value>;

    async fn write_attribute_value(
        &self,
        asset_id: &str,
        attribute_name: &str,
        value: &Value,
    ) -> Result<Value>;

    async fn realms(&self) -> Result<Value>;

    async fn realm(&self, realm_name: &str) -> Result<Value>;

    /// Lightweight status probe.
    async fn health_status(&self) -> Result<Value>;
}
