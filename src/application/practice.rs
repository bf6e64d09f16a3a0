//! Practice flow: synchronous scrape-and-analyze against one of the
//! alternate review sources. Unlike the marketplace flow there is no job to
//! poll; the backend answers with the finished summary.

use tracing::info;

use crate::domain::analysis::PracticeSentimentSummary;
use crate::domain::source_query::{normalize_query, PracticeSource};
use crate::infrastructure::api_client::ApiClient;
use crate::infrastructure::error::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeAnalysis {
    pub source: PracticeSource,
    /// Canonical query actually sent to the scraper
    pub query: String,
    pub summary: PracticeSentimentSummary,
}

#[derive(Debug, Clone)]
pub struct PracticeService {
    client: ApiClient,
}

impl PracticeService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn analyze(
        &self,
        source: PracticeSource,
        input: &str,
    ) -> Result<PracticeAnalysis, ApiError> {
        let query = normalize_query(source, input);
        if query.is_empty() {
            return Err(ApiError::validation("query", "Please enter a title or URL"));
        }

        info!("🎯 Practice analysis on {} for '{}'", source, query);
        let summary = self.client.analyze_practice(source, &query).await?;
        Ok(PracticeAnalysis {
            source,
            query,
            summary,
        })
    }
}
