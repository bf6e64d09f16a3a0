//! Periodic backend health check
//!
//! Checks once immediately, then at a fixed cadence, until stopped or dropped.

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::infrastructure::api_client::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Checking,
    Online,
    Offline,
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Checking => "checking",
            Self::Online => "online",
            Self::Offline => "offline",
        })
    }
}

pub struct HealthMonitor {
    status: watch::Receiver<BackendStatus>,
    token: CancellationToken,
}

impl HealthMonitor {
    /// Must be called from within a tokio runtime
    pub fn spawn(client: ApiClient, interval: Duration) -> Self {
        let (tx, status) = watch::channel(BackendStatus::Checking);
        let token = CancellationToken::new();
        let task_token = token.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let next = tokio::select! {
                    biased;
                    () = task_token.cancelled() => break,
                    checked = check(&client) => checked,
                };
                tx.send_if_modified(|current| {
                    if *current == next {
                        return false;
                    }
                    info!("🩺 Backend is {}", next);
                    *current = next;
                    true
                });
            }
            debug!("Health monitor stopped");
        });

        Self { status, token }
    }

    pub fn status(&self) -> BackendStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<BackendStatus> {
        self.status.clone()
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// One check of `/health`
pub async fn check(client: &ApiClient) -> BackendStatus {
    match client.health_check().await {
        Ok(health) => {
            debug!("Health check ok ({})", health.status);
            BackendStatus::Online
        }
        Err(e) => {
            warn!("⚠️ Health check failed: {}", e);
            BackendStatus::Offline
        }
    }
}
