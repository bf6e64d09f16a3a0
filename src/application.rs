//! Application layer
//!
//! Use cases built on the API client: the polling orchestrator, the recent
//! analyses cache, and the smaller request/response flows.

pub mod analysis_orchestrator;
pub mod auth_service;
pub mod health_monitor;
pub mod practice;
pub mod recent_analyses;
pub mod search_flow;
pub mod upload;

pub use analysis_orchestrator::{
    AnalysisHandle, AnalysisOrchestrator, AnalysisState, AnalysisStatus, TIMEOUT_MESSAGE,
};
pub use auth_service::AuthService;
pub use health_monitor::{BackendStatus, HealthMonitor};
pub use practice::{PracticeAnalysis, PracticeService};
pub use recent_analyses::{RecentAnalysesCache, RecentAnalysesState};
pub use search_flow::{SearchFlow, SubmitOutcome};
pub use upload::{UploadFile, UploadService};
