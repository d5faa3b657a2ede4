//! Health check surface.
//!
//! Never fails: an unreachable platform or a missing registration is
//! reported as `unhealthy` so the host keeps answering while the backing
//! platform is down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::ServiceManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl HealthReport {
    fn unhealthy(service: &str, instance_id: Option<i64>, error: String) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            service: service.to_string(),
            instance_id,
            error: Some(error),
            last_heartbeat: None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Identity lookup plus one status probe against the platform.
pub async fn check(manager: &ServiceManager, service: &str) -> HealthReport {
    let identity = match manager.current_identity().await {
        Ok(identity) => identity,
        Err(e) => return HealthReport::unhealthy(service, None, e.to_string()),
    };

    let platform = match manager.platform().await {
        Ok(platform) => platform,
        Err(e) => return HealthReport::unhealthy(service, Some(identity.instance_id), e.to_string()),
    };

    match platform.health_status().await {
        Ok(_) => HealthReport {
            status: HealthStatus::Healthy,
            service: service.to_string(),
            instance_id: Some(identity.instance_id),
            error: None,
            last_heartbeat: manager
                .heartbeat_stats()
                .await
                .and_then(|stats| stats.last_success),
        },
        Err(e) => {
            tracing::warn!("health_probe_failed: service={}, error={}", identity, e);
            HealthReport::unhealthy(service, Some(identity.instance_id), e.to_string())
        }
    }
}
