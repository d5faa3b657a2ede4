//! Service lifecycle manager.
//!
//! Owns the external-service registration of this process:
//!
//! ```text
//!   UNREGISTERED ──register()──► REGISTERED ──deregister()──► DEREGISTERED
//! ```
//!
//! `REGISTERED` is entered only after the platform hands out a
//! `ServiceIdentity`, and it owns the running heartbeat task. `DEREGISTERED`
//! is terminal. Transitions hold the state lock for their whole duration, so
//! register and deregister never interleave.

pub mod heartbeat;

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::platform::{ExternalServiceDescriptor, Platform, PlatformClient};
use crate::types::{Config, Error, Result, ServiceIdentity};
use crate::validation::validate_non_zero_duration;

pub use heartbeat::{send_heartbeat, HeartbeatStats, HeartbeatTask};

/// Default bounded wait for an in-flight heartbeat on shutdown.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    Unregistered,
    Registered,
    Deregistered,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Unregistered => "UNREGISTERED",
            ServiceState::Registered => "REGISTERED",
            ServiceState::Deregistered => "DEREGISTERED",
        };
        f.write_str(s)
    }
}

struct Registration {
    platform: Arc<dyn Platform>,
    identity: ServiceIdentity,
    heartbeat: HeartbeatTask,
}

enum LifecycleState {
    Unregistered,
    Registered(Registration),
    Deregistered,
}

impl LifecycleState {
    fn kind(&self) -> ServiceState {
        match self {
            LifecycleState::Unregistered => ServiceState::Unregistered,
            LifecycleState::Registered(_) => ServiceState::Registered,
            LifecycleState::Deregistered => ServiceState::Deregistered,
        }
    }
}

/// Process-wide service context. Construct once at startup and share via `Arc`.
pub struct ServiceManager {
    state: Mutex<LifecycleState>,
    shutdown_grace: Duration,
}

impl fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceManager")
            .field("shutdown_grace", &self.shutdown_grace)
            .finish_non_exhaustive()
    }
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManager {
    pub fn new() -> Self {
        Self::with_shutdown_grace(DEFAULT_SHUTDOWN_GRACE)
    }

    pub fn with_shutdown_grace(shutdown_grace: Duration) -> Self {
        Self {
            state: Mutex::new(LifecycleState::Unregistered),
            shutdown_grace,
        }
    }

    pub async fn state(&self) -> ServiceState {
        self.state.lock().await.kind()
    }

    /// Register with the platform and start the heartbeat loop.
    ///
    /// Any remote failure becomes `RegistrationFailed` and leaves the manager
    /// in `UNREGISTERED` with no heartbeat running.
    pub async fn register(
        &self,
        platform: Arc<dyn Platform>,
        descriptor: ExternalServiceDescriptor,
        heartbeat_interval: Duration,
    ) -> Result<ServiceIdentity> {
        validate_non_zero_duration(heartbeat_interval, "heartbeat_interval")?;

        let mut state = self.state.lock().await;
        if !matches!(*state, LifecycleState::Unregistered) {
            return Err(Error::state_transition(format!(
                "cannot register while {}",
                state.kind()
            )));
        }

        let identity = match platform.register_service(&descriptor).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!(
                    "service_registration_failed: service_id={}, category={}, error={}",
                    descriptor.service_id,
                    e.remote_failure(),
                    e
                );
                return Err(Error::registration_failed(&e));
            }
        };

        tracing::info!(
            "service_registered: service_id={}, instance_id={}, heartbeat_interval_s={}",
            identity.service_id,
            identity.instance_id,
            heartbeat_interval.as_secs()
        );

        let heartbeat =
            HeartbeatTask::spawn(Arc::clone(&platform), identity.clone(), heartbeat_interval);
        *state = LifecycleState::Registered(Registration {
            platform,
            identity: identity.clone(),
            heartbeat,
        });

        Ok(identity)
    }

    /// Open a `PlatformClient` from `config` and register through it.
    pub async fn register_with_config(&self, config: &Config) -> Result<ServiceIdentity> {
        let client = PlatformClient::from_config(&config.openremote).map_err(|e| {
            tracing::error!(
                "service_registration_failed: stage=connect, category={}, error={}",
                e.remote_failure(),
                e
            );
            Error::registration_failed(&e)
        })?;

        let descriptor = ExternalServiceDescriptor::available(
            &config.service.service_id,
            &config.service.label,
            &config.service.homepage_url,
        );

        self.register(
            Arc::new(client),
            descriptor,
            config.openremote.heartbeat_interval,
        )
        .await
    }

    pub async fn current_identity(&self) -> Result<ServiceIdentity> {
        match &*self.state.lock().await {
            LifecycleState::Registered(registration) => Ok(registration.identity.clone()),
            other => Err(Error::not_initialized(format!(
                "no service identity while {}",
                other.kind()
            ))),
        }
    }

    /// Connection used by the registration; shared by tools and health checks.
    pub async fn platform(&self) -> Result<Arc<dyn Platform>> {
        match &*self.state.lock().await {
            LifecycleState::Registered(registration) => Ok(Arc::clone(&registration.platform)),
            other => Err(Error::not_initialized(format!(
                "no platform connection while {}",
                other.kind()
            ))),
        }
    }

    /// Send one heartbeat outside the periodic loop.
    pub async fn heartbeat(&self) -> Result<()> {
        let (platform, identity) = match &*self.state.lock().await {
            LifecycleState::Registered(registration) => (
                Arc::clone(&registration.platform),
                registration.identity.clone(),
            ),
            other => {
                return Err(Error::not_initialized(format!(
                    "cannot heartbeat while {}",
                    other.kind()
                )))
            }
        };
        send_heartbeat(platform.as_ref(), &identity).await
    }

    pub async fn heartbeat_stats(&self) -> Option<HeartbeatStats> {
        match &*self.state.lock().await {
            LifecycleState::Registered(registration) => Some(registration.heartbeat.stats()),
            _ => None,
        }
    }

    /// Stop the heartbeat loop and deregister. Terminal.
    ///
    /// The manager ends up `DEREGISTERED` even when the remote call fails;
    /// that failure is returned. Calling it again is a no-op.
    pub async fn deregister(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let registration = match std::mem::replace(&mut *state, LifecycleState::Deregistered) {
            LifecycleState::Registered(registration) => registration,
            LifecycleState::Deregistered => return Ok(()),
            LifecycleState::Unregistered => {
                *state = LifecycleState::Unregistered;
                return Err(Error::not_initialized("cannot deregister before registering"));
            }
        };

        registration.heartbeat.stop(self.shutdown_grace).await;

        match registration
            .platform
            .deregister_service(&registration.identity)
            .await
        {
            Ok(()) => {
                tracing::info!("service_deregistered: service={}", registration.identity);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    "service_deregistration_failed: service={}, category={}, error={}",
                    registration.identity,
                    e.remote_failure(),
                    e
                );
                Err(e)
            }
        }
    }
}
