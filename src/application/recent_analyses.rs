//! Recent-analyses cache
//!
//! Holds the latest analyses in server order. Mutations never touch the list
//! locally: they call the backend and re-fetch.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::analysis::AnalysisResult;
use crate::infrastructure::api_client::ApiClient;
use crate::infrastructure::error::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct RecentAnalysesState {
    pub analyses: Vec<AnalysisResult>,
    /// `true` until the first fetch resolves, and during every refresh
    pub is_loading: bool,
    pub error: Option<ApiError>,
}

impl Default for RecentAnalysesState {
    fn default() -> Self {
        Self {
            analyses: Vec::new(),
            is_loading: true,
            error: None,
        }
    }
}

pub struct RecentAnalysesCache {
    client: ApiClient,
    limit: usize,
    state: watch::Sender<RecentAnalysesState>,
}

impl RecentAnalysesCache {
    pub fn new(client: ApiClient, limit: usize) -> Self {
        let (state, _) = watch::channel(RecentAnalysesState::default());
        Self {
            client,
            limit,
            state,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn state(&self) -> RecentAnalysesState {
        self.state.borrow().clone()
    }

    pub fn analyses(&self) -> Vec<AnalysisResult> {
        self.state.borrow().analyses.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RecentAnalysesState> {
        self.state.subscribe()
    }

    /// Re-fetch from scratch. On failure the previous list is kept and the
    /// error is both stored and returned.
    pub async fn refresh(&self) -> Result<Vec<AnalysisResult>, ApiError> {
        self.state.send_modify(|s| s.is_loading = true);

        match self.client.list_analyses(self.limit).await {
            Ok(analyses) => {
                debug!("📋 Loaded {} recent analyses", analyses.len());
                self.state.send_modify(|s| {
                    s.analyses = analyses.clone();
                    s.is_loading = false;
                    s.error = None;
                });
                Ok(analyses)
            }
            Err(e) => {
                warn!("⚠️ Failed to load recent analyses: {}", e);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(e.clone());
                });
                Err(e)
            }
        }
    }

    /// Delete one analysis, then refresh whatever the delete outcome was.
    /// A delete failure takes precedence over a refresh failure.
    pub async fn delete(&self, analysis_id: i64) -> Result<(), ApiError> {
        let deleted = self.client.delete_analysis(analysis_id).await;
        match &deleted {
            Ok(_) => info!("🗑️ Deleted analysis {}", analysis_id),
            Err(e) => warn!("❌ Failed to delete analysis {}: {}", analysis_id, e),
        }
        let refreshed = self.refresh().await;
        deleted?;
        refreshed.map(|_| ())
    }

    /// Clear every analysis on the backend, then refresh
    pub async fn clear_all(&self) -> Result<(), ApiError> {
        let cleared = self.client.clear_all_analyses().await;
        match &cleared {
            Ok(_) => info!("🧹 Cleared all analyses"),
            Err(e) => warn!("❌ Failed to clear analyses: {}", e),
        }
        let refreshed = self.refresh().await;
        cleared?;
        refreshed.map(|_| ())
    }

    /// Fresh copy of a cached analysis, or the cached copy if the fetch fails
    pub async fn open(&self, cached: &AnalysisResult) -> AnalysisResult {
        match self.client.get_analysis(cached.product_id).await {
            Ok(fresh) => fresh,
            Err(e) => {
                debug!("Using cached analysis for product {}: {}", cached.product_id, e);
                cached.clone()
            }
        }
    }
}
