//! Input dispatch: a pasted product URL goes to the analysis orchestrator,
//! anything else becomes a cross-platform search.

use std::sync::Arc;

use tracing::info;

use crate::application::analysis_orchestrator::{AnalysisHandle, AnalysisOrchestrator};
use crate::domain::product::SearchResult;
use crate::domain::query_classifier::{classify_input, InputKind};
use crate::infrastructure::api_client::ApiClient;
use crate::infrastructure::error::ApiError;

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Input was a URL; the analysis is running
    Analysis(AnalysisHandle),
    /// Input was a product name
    Search(Vec<SearchResult>),
}

pub struct SearchFlow {
    client: ApiClient,
    orchestrator: Arc<AnalysisOrchestrator>,
    default_platform: String,
}

impl SearchFlow {
    pub fn new(
        client: ApiClient,
        orchestrator: Arc<AnalysisOrchestrator>,
        default_platform: impl Into<String>,
    ) -> Self {
        Self {
            client,
            orchestrator,
            default_platform: default_platform.into(),
        }
    }

    pub fn orchestrator(&self) -> &Arc<AnalysisOrchestrator> {
        &self.orchestrator
    }

    /// Classify `input` and dispatch it. `platform` overrides the default
    /// platform hint for URL submissions.
    pub async fn submit(
        &self,
        input: &str,
        platform: Option<&str>,
    ) -> Result<SubmitOutcome, ApiError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ApiError::validation("input", "Please enter a product URL or name"));
        }

        match classify_input(input) {
            InputKind::DirectUrl => {
                let platform = platform.unwrap_or(&self.default_platform);
                info!("🔗 Input classified as product URL (platform: {})", platform);
                Ok(SubmitOutcome::Analysis(self.orchestrator.start(input, Some(platform))))
            }
            InputKind::SearchQuery => {
                info!("🔍 Input classified as search query: '{}'", input);
                self.search(input, &[]).await.map(SubmitOutcome::Search)
            }
        }
    }

    pub async fn search(
        &self,
        product_name: &str,
        platforms: &[String],
    ) -> Result<Vec<SearchResult>, ApiError> {
        let results = self.client.search_products(product_name.trim(), platforms).await?;
        info!("🔍 Search returned {} result(s)", results.len());
        Ok(results)
    }
}
