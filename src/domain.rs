//! Domain module - payloads and pure decision logic
//!
//! Nothing in here touches the network. Input classification and practice
//! query normalization are pure functions; the payload types mirror the
//! backend's JSON and carry display helpers.

pub mod analysis;
pub mod auth;
pub mod product;
pub mod query_classifier;
pub mod source_query;
pub mod timestamp;

pub use analysis::{
    AnalysisRequest, AnalysisResponse, AnalysisResult, HealthStatus, PracticeRequest,
    PracticeSentimentSummary, SentimentBreakdown, SentimentLabel, StatusMessage,
    UploadAnalysisResponse,
};
pub use auth::{
    AuthResponse, LoginCredentials, ProfileUpdate, RegisterData, RegistrationForm, User,
    ValidationError,
};
pub use product::{PlatformPrice, PriceComparison, Product, SearchResult};
pub use query_classifier::{classify_input, is_direct_url, InputKind};
pub use source_query::{normalize_query, PracticeSource};
