//! Analysis orchestrator
//!
//! Drives one product analysis from submission to a terminal state:
//!
//! ```text
//! Idle -> Submitting -> Polling -> { Succeeded | TimedOut | Failed }
//! ```
//!
//! Cancelling the current submission, via its handle or `reset`, goes back to
//! `Idle`.
//!
//! Each submission runs as a single spawned task (submit, initial delay,
//! then sequential poll attempts). The task owns a cancellation token that is
//! checked at every suspension point. State is published through a
//! `tokio::sync::watch` channel; every write is tagged with the submission
//! generation, so a superseded chain can never overwrite newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::analysis::{AnalysisRequest, AnalysisResult};
use crate::infrastructure::api_client::ApiClient;
use crate::infrastructure::config::PollingConfig;
use crate::infrastructure::error::ApiError;

pub const TIMEOUT_MESSAGE: &str = "Analysis timeout - please try again";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Submitting,
    /// Waiting for or running poll attempt `attempt` (1-based)
    Polling { attempt: u32 },
    Succeeded,
    TimedOut,
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::TimedOut | Self::Failed)
    }

    pub fn is_busy(self) -> bool {
        matches!(self, Self::Submitting | Self::Polling { .. })
    }
}

/// Snapshot published to observers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisState {
    pub status: AnalysisStatus,
    pub result: Option<AnalysisResult>,
    pub error: Option<ApiError>,
    /// Failed poll attempts so far; the successful attempt number on success
    pub attempts: u32,
    pub product_id: Option<i64>,
}

impl AnalysisState {
    fn submitting() -> Self {
        Self {
            status: AnalysisStatus::Submitting,
            ..Self::default()
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(ApiError::message)
    }
}

/// Handle to one submission's task
#[derive(Debug)]
pub struct AnalysisHandle {
    generation: u64,
    token: CancellationToken,
    join: JoinHandle<AnalysisState>,
}

impl AnalysisHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cooperative: the chain stops at its next suspension point. If this
    /// submission is still the current one, the orchestrator returns to `Idle`.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the chain to stop. Returns the last state this submission
    /// reached, whether or not it was still the current one.
    pub async fn wait(self) -> Result<AnalysisState, JoinError> {
        self.join.await
    }
}

struct Shared {
    state: watch::Sender<AnalysisState>,
    generation: AtomicU64,
}

impl Shared {
    /// Publish `state` only while `generation` is still current. The check runs
    /// under the channel's write lock, so it cannot interleave with a newer
    /// `start` or `reset`.
    fn publish(&self, generation: u64, state: &AnalysisState) -> bool {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = state.clone();
            true
        })
    }

    /// Begin a new generation with `state` as its first value
    fn advance(&self, state: AnalysisState) -> u64 {
        let mut next = 0;
        self.state.send_modify(|current| {
            next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *current = state;
        });
        next
    }
}

pub struct AnalysisOrchestrator {
    client: ApiClient,
    polling: PollingConfig,
    shared: Arc<Shared>,
    current: Mutex<Option<CancellationToken>>,
}

impl AnalysisOrchestrator {
    pub fn new(client: ApiClient, polling: PollingConfig) -> Self {
        let (state, _) = watch::channel(AnalysisState::default());
        Self {
            client,
            polling,
            shared: Arc::new(Shared {
                state,
                generation: AtomicU64::new(0),
            }),
            current: Mutex::new(None),
        }
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    pub fn state(&self) -> AnalysisState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.shared.state.subscribe()
    }

    /// Submit `product_url` for analysis and poll for the result.
    ///
    /// Any chain still running for a previous submission is cancelled first.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, product_url: &str, platform: Option<&str>) -> AnalysisHandle {
        let token = CancellationToken::new();
        if let Some(previous) = self.swap_token(Some(token.clone())) {
            debug!("Superseding running analysis");
            previous.cancel();
        }

        let generation = self.shared.advance(AnalysisState::submitting());
        info!("🚀 Starting analysis #{} for {}", generation, product_url);

        let chain = PollChain {
            client: self.client.clone(),
            polling: self.polling,
            shared: Arc::clone(&self.shared),
            generation,
            token: token.clone(),
            local: AnalysisState::submitting(),
        };
        let request = AnalysisRequest::new(product_url.trim(), platform.map(str::to_string));
        let join = tokio::spawn(chain.run(request));

        AnalysisHandle {
            generation,
            token,
            join,
        }
    }

    /// Cancel any running chain and return to `Idle`. Idempotent.
    pub fn reset(&self) {
        if let Some(token) = self.swap_token(None) {
            token.cancel();
        }
        self.shared.advance(AnalysisState::default());
        debug!("Analysis state reset");
    }

    fn swap_token(&self, next: Option<CancellationToken>) -> Option<CancellationToken> {
        match self.current.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        }
    }
}

impl Drop for AnalysisOrchestrator {
    fn drop(&mut self) {
        if let Some(token) = self.swap_token(None) {
            token.cancel();
        }
    }
}

/// One submission's chain, run on its own task
struct PollChain {
    client: ApiClient,
    polling: PollingConfig,
    shared: Arc<Shared>,
    generation: u64,
    token: CancellationToken,
    local: AnalysisState,
}

impl PollChain {
    fn publish(&self) {
        if !self.shared.publish(self.generation, &self.local) {
            debug!("Analysis #{} is stale, state not published", self.generation);
        }
    }

    /// `false` when cancelled during the wait
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            () = self.token.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }

    fn fail(&mut self, error: ApiError) {
        self.local.status = AnalysisStatus::Failed;
        self.local.error = Some(error);
        self.publish();
    }

    async fn run(mut self, request: AnalysisRequest) -> AnalysisState {
        if request.product_url.is_empty() {
            self.fail(ApiError::validation("product_url", "Please enter a product URL"));
            return self.local;
        }

        let submitted = tokio::select! {
            biased;
            () = self.token.cancelled() => return self.cancelled(),
            response = self.client.analyze_product(&request) => response,
        };
        let response = match submitted {
            Ok(response) => response,
            Err(e) => {
                warn!("❌ Analysis #{} submission failed: {}", self.generation, e);
                self.fail(e);
                return self.local;
            }
        };

        let product_id = response.product_id;
        info!(
            "📨 Analysis #{} accepted for product {} ({})",
            self.generation, product_id, response.status
        );
        self.local.product_id = Some(product_id);
        self.local.status = AnalysisStatus::Polling { attempt: 1 };
        self.publish();

        if !self.sleep(self.polling.initial_delay()).await {
            return self.cancelled();
        }

        let max_attempts = self.polling.max_attempts;
        loop {
            let attempt = self.local.attempts + 1;
            debug!("🔄 Polling analysis for product {} (attempt {}/{})", product_id, attempt, max_attempts);

            let fetched = tokio::select! {
                biased;
                () = self.token.cancelled() => return self.cancelled(),
                fetched = self.client.get_analysis(product_id) => fetched,
            };

            match fetched {
                Ok(result) => {
                    info!("✅ Analysis ready for product {} after {} attempt(s)", product_id, attempt);
                    self.local.status = AnalysisStatus::Succeeded;
                    self.local.attempts = attempt;
                    self.local.result = Some(result);
                    self.publish();
                    return self.local;
                }
                Err(e) => {
                    // per-attempt errors are retried, only the budget matters
                    debug!("Attempt {} for product {} not ready: {}", attempt, product_id, e);
                    self.local.attempts = attempt;
                    if attempt >= max_attempts {
                        warn!("⏱️ Analysis for product {} timed out after {} attempts", product_id, attempt);
                        self.local.status = AnalysisStatus::TimedOut;
                        self.local.error = Some(ApiError::timeout(TIMEOUT_MESSAGE, attempt));
                        self.publish();
                        return self.local;
                    }
                    self.local.status = AnalysisStatus::Polling { attempt: attempt + 1 };
                    self.publish();
                }
            }

            if !self.sleep(self.polling.interval()).await {
                return self.cancelled();
            }
        }
    }

    /// A cancelled chain that is still current hands the orchestrator back
    /// as `Idle`; a superseded one leaves the newer state alone.
    fn cancelled(self) -> AnalysisState {
        debug!("🛑 Analysis #{} cancelled", self.generation);
        if self.shared.publish(self.generation, &AnalysisState::default()) {
            debug!("Analysis #{} was current, back to idle", self.generation);
        }
        self.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_and_busy_states() {
        assert!(AnalysisStatus::Succeeded.is_terminal());
        assert!(AnalysisStatus::TimedOut.is_terminal());
        assert!(AnalysisStatus::Failed.is_terminal());
        assert!(!AnalysisStatus::Idle.is_terminal());
        assert!(AnalysisStatus::Polling { attempt: 3 }.is_busy());
        assert!(!AnalysisStatus::Idle.is_busy());
    }

    #[test]
    fn stale_generation_cannot_publish() {
        let (state, _) = watch::channel(AnalysisState::default());
        let shared = Shared {
            state,
            generation: AtomicU64::new(0),
        };

        let first = shared.advance(AnalysisState::submitting());
        let second = shared.advance(AnalysisState::submitting());
        assert_eq!(second, first + 1);

        let stale = AnalysisState {
            status: AnalysisStatus::Succeeded,
            ..Default::default()
        };
        assert!(!shared.publish(first, &stale));
        assert_eq!(shared.state.borrow().status, AnalysisStatus::Submitting);
        assert!(shared.publish(second, &stale));
        assert_eq!(shared.state.borrow().status, AnalysisStatus::Succeeded);
    }
}
