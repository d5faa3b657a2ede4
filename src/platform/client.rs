//! reqwest-backed OpenRemote client.
//!
//! Authenticates with the OAuth2 client-credentials grant against the
//! manager's Keycloak realm and attaches the bearer token to every REST call.
//! The token is cached and fetched again shortly before it expires, or after
//! the platform answered 401.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::schemas::{AssetObject, AssetQuery, AssetTypeInfo, ExternalServiceDescriptor};
use super::Platform;
use crate::types::{Error, OpenRemoteConfig, Result, ServiceIdentity};

/// Tokens are refreshed this long before the identity provider says they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    300
}

/// Authenticated OpenRemote REST client.
#[derive(Debug)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: Url,
    realm: String,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<AccessToken>>,
}

impl PlatformClient {
    pub fn new(
        url: &str,
        realm: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        verify_ssl: bool,
    ) -> Result<Self> {
        let base_url = Url::parse(url)
            .map_err(|e| Error::validation(format!("Invalid platform url '{}': {}", url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::validation(format!(
                "Platform url '{}' cannot be used as a base url",
                url
            )));
        }

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify_ssl)
            .build()?;

        Ok(Self {
            http,
            base_url,
            realm: realm.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: RwLock::new(None),
        })
    }

    pub fn from_config(config: &OpenRemoteConfig) -> Result<Self> {
        Self::new(
            &config.url,
            config.realm.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
            config.verify_ssl,
        )
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::internal("platform url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `{base}/api/{realm}/{segments...}`, each segment percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut all = Vec::with_capacity(segments.len() + 2);
        all.push("api");
        all.push(self.realm.as_str());
        all.extend_from_slice(segments);
        self.url(&all)
    }

    fn token_url(&self) -> Result<Url> {
        self.url(&[
            "auth",
            "realms",
            self.realm.as_str(),
            "protocol",
            "openid-connect",
            "token",
        ])
    }

    async fn access_token(&self) -> Result<String> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref().filter(|t| t.is_fresh()) {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        // Another caller may have refreshed while we waited for the write lock.
        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    async fn fetch_token(&self) -> Result<AccessToken> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self.http.post(self.token_url()?).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::authentication(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!("access_token_acquired: expires_in={}s", token.expires_in);

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }

    async fn authorized(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(self
            .http
            .request(method, self.api_url(segments)?)
            .bearer_auth(token))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.token.write().await.take();
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.execute(request).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Platform for PlatformClient {
    async fn register_service(
        &self,
        descriptor: &ExternalServiceDescriptor,
    ) -> Result<ServiceIdentity> {
        let request = self.authorized(Method::POST, &["service"]).await?.json(descriptor);
        self.execute_json(request).await
    }

    async fn heartbeat(&self, identity: &ServiceIdentity) -> Result<()> {
        let instance_id = identity.instance_id.to_string();
        let request = self
            .authorized(
                Method::PUT,
                &["service", identity.service_id.as_str(), instance_id.as_str()],
            )
            .await?;
        self.execute(request).await?;
        Ok(())
    }

    async fn deregister_service(&self, identity: &ServiceIdentity) -> Result<()> {
        let instance_id = identity.instance_id.to_string();
        let request = self
            .authorized(
                Method::DELETE,
                &["service", identity.service_id.as_str(), instance_id.as_str()],
            )
            .await?;
        self.execute(request).await?;
        Ok(())
    }

    async fn asset_infos(&self) -> Result<Vec<AssetTypeInfo>> {
        let request = self.authorized(Method::GET, &["model", "assetInfos"]).await?;
        self.execute_json(request).await
    }

    async fn asset_info(&self, asset_type: &str) -> Result<AssetTypeInfo> {
        let request = self
            .authorized(Method::GET, &["model", "assetInfo", asset_type])
            .await?;
        self.execute_json(request).await
    }

    async fn query_assets(&self, query: &AssetQuery) -> Result<Value> {
        let request = self
            .authorized(Method::POST, &["asset", "query"])
            .await?
            .json(query);
        self.execute_json(request).await
    }

    async fn get_asset(&self, asset_id: &str) -> Result<Value> {
        let request = self.authorized(Method::GET, &["asset", asset_id]).await?;
        self.execute_json(request).await
    }

    async fn create_asset(&self, asset: &AssetObject) -> Result<Value> {
        let request = self.authorized(Method::POST, &["asset"]).await?.json(asset);
        self.execute_json(request).await
    }

    async fn write_attribute_value(
        &self,
        asset_id: &str,
        attribute_name: &str,
        value: &Value,
    ) -> Result<Value> {
        let request = self
            .authorized(Method::PUT, &["asset", asset_id, "attribute", attribute_name])
            .await?
            .json(value);
        self.execute_json(request).await
    }

    async fn realms(&self) -> Result<Value> {
        let request = self.authorized(Method::GET, &["realm"]).await?;
        self.execute_json(request).await
    }

    async fn realm(&self, realm_name: &str) -> Result<Value> {
        let request = self.authorized(Method::GET, &["realm", realm_name]).await?;
        self.execute_json(request).await
    }

    async fn health_status(&self) -> Result<Value> {
        let request = self.authorized(Method::GET, &["health"]).await?;
        self.execute_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> PlatformClient {
        PlatformClient::new(url, "master", "mcp", "secret", true).unwrap()
    }

    #[test]
    fn test_api_url_layout() {
        let c = client("https://manager.local/");
        assert_eq!(
            c.api_url(&["model", "assetInfos"]).unwrap().as_str(),
            "https://manager.local/api/master/model/assetInfos"
        );
    }

    #[test]
    fn test_api_url_keeps_base_path_and_encodes_segments() {
        let c = client("https://manager.local/openremote");
        assert_eq!(
            c.api_url(&["asset", "a b/c"]).unwrap().as_str(),
            "https://manager.local/openremote/api/master/asset/a%20b%2Fc"
        );
    }

    #[test]
    fn test_token_url() {
        let c = client("http://localhost:8080");
        assert_eq!(
            c.token_url().unwrap().as_str(),
            "http://localhost:8080/auth/realms/master/protocol/openid-connect/token"
        );
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(PlatformClient::new("not a url", "master", "a", "b", true).is_err());
        assert!(PlatformClient::new("mailto:x@y", "master", "a", "b", true).is_err());
    }
}
