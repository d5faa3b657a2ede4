//! Supervised heartbeat task.
//!
//! Sleeps for the configured interval, sends one heartbeat, repeats. A failed
//! heartbeat is logged and the loop carries on; only cancellation ends it.
//! The sleep is cancellable at any point; an in-flight heartbeat gets a
//! bounded grace period before the task is aborted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::platform::Platform;
use crate::types::{Error, Result, ServiceIdentity};

/// Running totals of the heartbeat loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatStats {
    pub sent: u64,
    pub failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Send one heartbeat, folding any remote failure into `HeartbeatFailed`.
pub async fn send_heartbeat(platform: &dyn Platform, identity: &ServiceIdentity) -> Result<()> {
    platform
        .heartbeat(identity)
        .await
        .map_err(|e| Error::HeartbeatFailed(format!("{} ({})", e, e.remote_failure())))
}

/// Handle to the background heartbeat loop.
#[derive(Debug)]
pub struct HeartbeatTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    stats: watch::Receiver<HeartbeatStats>,
}

impl HeartbeatTask {
    /// Start the loop. The first heartbeat fires one `interval` after spawning.
    pub fn spawn(
        platform: Arc<dyn Platform>,
        identity: ServiceIdentity,
        interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (stats_tx, stats_rx) = watch::channel(HeartbeatStats::default());
        let span = tracing::info_span!("heartbeat", service = %identity);

        let token = cancel.clone();
        let handle = tokio::spawn(
            async move {
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(interval) => {}
                    }

                    match send_heartbeat(platform.as_ref(), &identity).await {
                        Ok(()) => {
                            tracing::debug!("heartbeat_sent: service={}", identity);
                            stats_tx.send_modify(|stats| {
                                stats.sent += 1;
                                stats.last_success = Some(Utc::now());
                                stats.last_error = None;
                            });
                        }
                        Err(e) => {
                            tracing::warn!("heartbeat_failed: service={}, error={}", identity, e);
                            stats_tx.send_modify(|stats| {
                                stats.failed += 1;
                                stats.last_error = Some(e.to_string());
                            });
                        }
                    }
                }
                tracing::info!("heartbeat_stopped: service={}", identity);
            }
            .instrument(span),
        );

        Self {
            cancel,
            handle,
            stats: stats_rx,
        }
    }

    pub fn stats(&self) -> HeartbeatStats {
        self.stats.borrow().clone()
    }

    /// Receiver that sees every stats update.
    pub fn subscribe(&self) -> watch::Receiver<HeartbeatStats> {
        self.stats.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the loop and join it, aborting after `grace`.
    pub async fn stop(mut self, grace: Duration) {
        self.cancel.cancel();
        match tokio::time::timeout(grace, &mut self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("heartbeat_task_panicked: error={}", e),
            Err(_) => {
                tracing::warn!(
                    "heartbeat_stop_timed_out: grace_ms={}, aborting in-flight heartbeat",
                    grace.as_millis()
                );
                self.handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockPlatform;
    use crate::types::ServiceId;
    use std::sync::Mutex;
    use tokio::time::Instant;
    use tracing_test::traced_test;

    fn identity() -> ServiceIdentity {
        ServiceIdentity {
            service_id: ServiceId::from_string("MCP-Server".to_string()).unwrap(),
            instance_id: 3,
        }
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_failure_is_logged_and_next_beat_keeps_schedule() {
        let beats: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&beats);

        let mut platform = MockPlatform::new();
        let mut calls = 0u32;
        platform.expect_heartbeat().returning(move |_| {
            recorded.lock().unwrap().push(Instant::now());
            calls += 1;
            if calls == 1 {
                Err(Error::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        });

        let start = Instant::now();
        let task = HeartbeatTask::spawn(Arc::new(platform), identity(), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(65)).await;

        let beats = beats.lock().unwrap().clone();
        assert_eq!(beats.len(), 2);
        assert_eq!(beats[0] - start, Duration::from_secs(30));
        assert_eq!(beats[1] - beats[0], Duration::from_secs(30));

        let stats = task.stats();
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.failed, 1);
        assert!(stats.last_success.is_some());
        assert!(task.is_running());
        assert!(logs_contain("heartbeat_failed"));

        task.stop(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_sleep() {
        let mut platform = MockPlatform::new();
        platform.expect_heartbeat().times(0);

        let task = HeartbeatTask::spawn(Arc::new(platform), identity(), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(10)).await;

        let stats = task.subscribe();
        task.stop(Duration::from_secs(1)).await;
        assert_eq!(stats.borrow().sent, 0);

        // Nothing fires after the first deadline.
        tokio::time::sleep(Duration::from_secs(60)).await;
    }

    #[tokio::test]
    async fn test_send_heartbeat_wraps_error() {
        let mut platform = MockPlatform::new();
        platform
            .expect_heartbeat()
            .returning(|_| Err(Error::authentication("token expired")));

        let err = send_heartbeat(&platform, &identity()).await.unwrap_err();
        match err {
            Error::HeartbeatFailed(msg) => {
                assert!(msg.contains("token expired"));
                assert!(msg.contains("authentication"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
