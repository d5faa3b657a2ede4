//! Configuration structures.
//!
//! Configuration is supplied from outside the core (environment variables via
//! the CLI in `main.rs`); these structs only carry and validate it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::validation::{validate_non_empty, validate_non_zero_duration};

/// Global facade configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote platform connection.
    #[serde(default)]
    pub openremote: OpenRemoteConfig,

    /// How this facade advertises itself to the platform.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Reject configurations the facade cannot start with.
    pub fn validate(&self) -> crate::types::Result<()> {
        validate_non_empty(&self.openremote.url, "openremote.url")?;
        validate_non_empty(&self.openremote.realm, "openremote.realm")?;
        validate_non_empty(&self.openremote.client_id, "openremote.client_id")?;
        validate_non_empty(&self.openremote.client_secret, "openremote.client_secret")?;
        validate_non_zero_duration(
            self.openremote.heartbeat_interval,
            "openremote.heartbeat_interval",
        )?;
        validate_non_empty(&self.service.service_id, "service.service_id")?;
        Ok(())
    }
}

/// Connection to the OpenRemote manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRemoteConfig {
    /// Base URL of the manager, e.g. `https://demo.openremote.io`.
    pub url: String,

    /// Realm used for token exchange and REST calls.
    pub realm: String,

    /// OAuth2 client-credentials client id.
    pub client_id: String,

    /// OAuth2 client-credentials secret.
    pub client_secret: String,

    /// Verify the manager's TLS certificate.
    pub verify_ssl: bool,

    /// Interval between liveness signals.
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,

    /// Bounded wait for an in-flight heartbeat during shutdown.
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for OpenRemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            realm: "master".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            verify_ssl: true,
            heartbeat_interval: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// External service descriptor fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub service_id: String,
    pub label: String,
    pub homepage_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_id: "MCP-Server".to_string(),
            label: "MCP Server".to_string(),
            homepage_url: "http://localhost:8420".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.openremote.url = "https://manager.local".to_string();
        config.openremote.client_id = "mcp".to_string();
        config.openremote.client_secret = "secret".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.openremote.realm, "master");
        assert!(config.openremote.verify_ssl);
        assert_eq!(config.openremote.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.service.service_id, "MCP-Server");
    }

    #[test]
    fn test_validate() {
        assert!(valid_config().validate().is_ok());
        assert!(Config::default().validate().is_err());

        let mut config = valid_config();
        config.openremote.heartbeat_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_humantime_intervals() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "openremote": {
                "url": "https://manager.local",
                "realm": "smartcity",
                "client_id": "mcp",
                "client_secret": "secret",
                "verify_ssl": false,
                "heartbeat_interval": "45s",
                "shutdown_grace": "2s",
            }
        }))
        .unwrap();
        assert_eq!(config.openremote.heartbeat_interval, Duration::from_secs(45));
        assert_eq!(config.openremote.shutdown_grace, Duration::from_secs(2));
        assert_eq!(config.service.label, "MCP Server");
    }
}
