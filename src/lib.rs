//! SmartMarket client - sentiment analysis for marketplace products
//!
//! Client core for the SmartMarket backend: input classification, the API
//! gateway, analysis submission with bounded polling, and the recent analyses
//! cache. The `smartmarket` binary is a thin command-line shell over it.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{
    AnalysisHandle, AnalysisOrchestrator, AnalysisState, AnalysisStatus, AuthService,
    BackendStatus, HealthMonitor, PracticeService, RecentAnalysesCache, SearchFlow,
    SubmitOutcome, UploadFile, UploadService,
};
pub use domain::{classify_input, normalize_query, AnalysisResult, InputKind, PracticeSource};
pub use infrastructure::{
    ApiClient, ApiError, AppConfig, ConfigManager, ErrorKind, HttpTransport, Session,
};
