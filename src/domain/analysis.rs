//! Sentiment analysis payloads
//!
//! Everything here is produced by the backend; the client only deserializes,
//! caches and displays these values.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::PriceComparison;
use crate::domain::source_query::PracticeSource;

/// Aggregate review tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    /// Also the fallback for labels this client does not know about
    #[serde(other)]
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review-count breakdown shared by every sentiment payload.
///
/// `positive + neutral + negative == total_reviews` is a backend invariant;
/// percentages always divide by `total_reviews`.
pub trait SentimentBreakdown {
    fn avg_sentiment(&self) -> f64;
    fn total_reviews(&self) -> u64;
    fn bucket_count(&self, label: SentimentLabel) -> u64;

    /// Average sentiment on the 0-5 star scale used for display
    fn scaled_score(&self) -> f64 {
        self.avg_sentiment() * 5.0
    }

    /// Share of reviews in `label`, 0-100. Zero when there are no reviews.
    fn bucket_percentage(&self, label: SentimentLabel) -> f64 {
        let total = self.total_reviews();
        if total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let share = self.bucket_count(label) as f64 / total as f64;
        share * 100.0
    }

    /// Percentage formatted with one decimal, e.g. `"42.5%"`
    fn format_percentage(&self, label: SentimentLabel) -> String {
        format!("{:.1}%", self.bucket_percentage(label))
    }

    fn counts_consistent(&self) -> bool {
        let sum = self.bucket_count(SentimentLabel::Positive)
            + self.bucket_count(SentimentLabel::Neutral)
            + self.bucket_count(SentimentLabel::Negative);
        sum == self.total_reviews()
    }
}

/// Completed analysis for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    #[serde(default)]
    pub product_price: Option<f64>,
    #[serde(default)]
    pub product_image_url: Option<String>,
    #[serde(default)]
    pub product_rating: Option<f64>,
    pub avg_sentiment: f64,
    pub sentiment_label: SentimentLabel,
    pub total_reviews: u64,
    pub positive_count: u64,
    pub negative_count: u64,
    pub neutral_count: u64,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// platform → price; absent or empty without comparison data
    #[serde(default)]
    pub price_data: Option<HashMap<String, f64>>,
    #[serde(with = "crate::domain::timestamp")]
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn price_comparison(&self) -> Option<PriceComparison> {
        self.price_data.as_ref().and_then(PriceComparison::from_prices)
    }
}

impl SentimentBreakdown for AnalysisResult {
    fn avg_sentiment(&self) -> f64 {
        self.avg_sentiment
    }

    fn total_reviews(&self) -> u64 {
        self.total_reviews
    }

    fn bucket_count(&self, label: SentimentLabel) -> u64 {
        match label {
            SentimentLabel::Positive => self.positive_count,
            SentimentLabel::Neutral => self.neutral_count,
            SentimentLabel::Negative => self.negative_count,
        }
    }
}

/// Body of `POST /api/analysis/analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub product_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl AnalysisRequest {
    pub fn new(product_url: impl Into<String>, platform: Option<String>) -> Self {
        Self {
            product_url: product_url.into(),
            platform,
        }
    }
}

/// Submission acknowledgment. Carries what is needed to poll, not the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub product_id: i64,
    pub product_url: String,
    #[serde(default)]
    pub platform: String,
}

/// Body of `POST /api/scrape/analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PracticeRequest {
    pub source: PracticeSource,
    pub query: String,
}

/// Result of the synchronous practice scrape-and-analyze flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeSentimentSummary {
    pub stars: f64,
    pub sentiment_label: SentimentLabel,
    pub avg_sentiment: f64,
    pub total_reviews: u64,
    pub positive_count: u64,
    pub negative_count: u64,
    pub neutral_count: u64,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub opinion_summary: String,
}

impl SentimentBreakdown for PracticeSentimentSummary {
    fn avg_sentiment(&self) -> f64 {
        self.avg_sentiment
    }

    fn total_reviews(&self) -> u64 {
        self.total_reviews
    }

    fn bucket_count(&self, label: SentimentLabel) -> u64 {
        match label {
            SentimentLabel::Positive => self.positive_count,
            SentimentLabel::Neutral => self.neutral_count,
            SentimentLabel::Negative => self.negative_count,
        }
    }
}

/// Response to a reviews dataset upload (`.json` / `.csv` / `.xlsx`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadAnalysisResponse {
    pub product_id: i64,
    pub product_name: String,
    pub stars: f64,
    pub sentiment_label: SentimentLabel,
    pub avg_sentiment: f64,
    pub total_reviews: u64,
    pub positive_count: u64,
    pub neutral_count: u64,
    pub negative_count: u64,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub opinion_summary: String,
}

impl SentimentBreakdown for UploadAnalysisResponse {
    fn avg_sentiment(&self) -> f64 {
        self.avg_sentiment
    }

    fn total_reviews(&self) -> u64 {
        self.total_reviews
    }

    fn bucket_count(&self, label: SentimentLabel) -> u64 {
        match label {
            SentimentLabel::Positive => self.positive_count,
            SentimentLabel::Neutral => self.neutral_count,
            SentimentLabel::Negative => self.negative_count,
        }
    }
}

/// `{status, message}` echo returned by delete/clear endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// `GET /health` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(total: u64, pos: u64, neu: u64, neg: u64) -> String {
        format!(
            r#"{{
                "id": 1, "product_id": 10, "product_name": "Echo Dot",
                "avg_sentiment": 0.62, "sentiment_label": "positive",
                "total_reviews": {total}, "positive_count": {pos},
                "neutral_count": {neu}, "negative_count": {neg},
                "keywords": ["sound", "alexa"], "price_data": null,
                "analyzed_at": "2024-05-01T12:00:00"
            }}"#
        )
    }

    #[test]
    fn decodes_backend_payload() {
        let result: AnalysisResult = serde_json::from_str(&sample_json(10, 6, 3, 1)).unwrap();
        assert_eq!(result.sentiment_label, SentimentLabel::Positive);
        assert_eq!(result.keywords, vec!["sound", "alexa"]);
        assert!(result.price_data.is_none());
        assert!(result.price_comparison().is_none());
        assert!(result.counts_consistent());
    }

    #[test]
    fn percentages_divide_by_total() {
        let result: AnalysisResult = serde_json::from_str(&sample_json(8, 5, 2, 1)).unwrap();
        assert_eq!(result.format_percentage(SentimentLabel::Positive), "62.5%");
        assert_eq!(result.format_percentage(SentimentLabel::Neutral), "25.0%");
        assert_eq!(result.format_percentage(SentimentLabel::Negative), "12.5%");
    }

    #[test]
    fn zero_reviews_render_as_zero_percent() {
        let result: AnalysisResult = serde_json::from_str(&sample_json(0, 0, 0, 0)).unwrap();
        for label in [SentimentLabel::Positive, SentimentLabel::Neutral, SentimentLabel::Negative] {
            assert_eq!(result.format_percentage(label), "0.0%");
        }
    }

    #[test]
    fn scaled_score_uses_five_point_scale() {
        let result: AnalysisResult = serde_json::from_str(&sample_json(1, 1, 0, 0)).unwrap();
        assert!((result.scaled_score() - 3.1).abs() < 1e-9);
    }

    #[test]
    fn unknown_labels_fall_back_to_neutral() {
        let label: SentimentLabel = serde_json::from_str(r#""mixed""#).unwrap();
        assert_eq!(label, SentimentLabel::Neutral);
    }

    #[test]
    fn known_labels_keep_their_wire_names() {
        for label in [SentimentLabel::Positive, SentimentLabel::Negative, SentimentLabel::Neutral] {
            let wire = serde_json::to_value(label).unwrap();
            assert_eq!(wire, serde_json::json!(label.as_str()));
            assert_eq!(serde_json::from_value::<SentimentLabel>(wire).unwrap(), label);
        }
    }

    #[test]
    fn request_omits_missing_platform() {
        let body = serde_json::to_value(AnalysisRequest::new("https://a.com/p", None)).unwrap();
        assert_eq!(body, serde_json::json!({"product_url": "https://a.com/p"}));
    }

    #[test]
    fn practice_request_serializes_source_identifier() {
        let body = serde_json::to_value(PracticeRequest {
            source: PracticeSource::RottenTomatoes,
            query: "the matrix".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"source": "rottentomatoes", "query": "the matrix"}));
    }
}
