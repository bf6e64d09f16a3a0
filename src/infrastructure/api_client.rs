//! API gateway client
//!
//! Single chokepoint for every backend call. It injects headers, hands the
//! request to the transport and folds every outcome into either a decoded
//! value or an [`ApiError`]. Callers never see transport or serde errors.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::domain::analysis::{
    AnalysisRequest, AnalysisResponse, AnalysisResult, HealthStatus, PracticeRequest,
    PracticeSentimentSummary, StatusMessage, UploadAnalysisResponse,
};
use crate::domain::product::{Product, SearchResult};
use crate::domain::source_query::PracticeSource;
use crate::infrastructure::config::ApiConfig;
use crate::infrastructure::error::ApiError;
use crate::infrastructure::session::Session;
use crate::infrastructure::transport::{
    ApiRequest, ApiResponse, HttpClientConfig, HttpTransport, MultipartFile, ReqwestTransport,
    RequestBody, TransportError,
};

pub const INVALID_RESPONSE_MESSAGE: &str =
    "Invalid response from server. Make sure the backend is running correctly.";

/// Shared API client. Cloning is cheap; clones share transport and session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    session: Session,
}

impl ApiClient {
    /// Trailing slashes of `base_url` are stripped.
    pub fn new(base_url: &str, transport: Arc<dyn HttpTransport>, session: Session) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                base_url: base_url.trim().trim_end_matches('/').to_string(),
                transport,
                session,
            }),
        }
    }

    /// Client over the real reqwest transport
    pub fn from_config(config: &ApiConfig, session: Session) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(HttpClientConfig {
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.request_timeout_seconds,
        })?;
        Ok(Self::new(&config.base_url, Arc::new(transport), session))
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Bearer token when the session has one; JSON content type only for JSON bodies
    fn headers(&self, json_body: bool) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(2);
        if json_body {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.inner.session.token() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }

    fn connectivity_error(&self, err: &TransportError) -> ApiError {
        ApiError::connectivity(
            format!(
                "Cannot connect to backend. Make sure the server is running on {}",
                self.inner.base_url
            ),
            Some(err.to_string()),
        )
    }

    async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let method = request.method.clone();
        let url = request.url.clone();
        debug!("➡️ {} {}", method, url);

        let response = self.inner.transport.send(request).await.map_err(|e| {
            warn!("❌ {} {} failed at transport level: {}", method, url, e);
            self.connectivity_error(&e)
        })?;

        let decoded = decode_response(&response, &self.inner.base_url);
        match &decoded {
            Ok(_) => debug!("✅ {} {} -> {}", method, url, response.status),
            Err(e) => warn!("⚠️ {} {} -> {} ({:?}): {}", method, url, response.status, e.kind(), e),
        }
        decoded
    }

    fn build(&self, method: Method, path: &str) -> ApiRequest {
        let mut request = ApiRequest::new(method, self.url(path));
        request.headers = self.headers(false);
        request
    }

    fn build_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<ApiRequest, ApiError> {
        let bytes = serde_json::to_vec(body).map_err(|e| {
            ApiError::validation("body", format!("Failed to encode request body: {e}"))
        })?;
        let mut request = ApiRequest::new(method, self.url(path));
        request.headers = self.headers(true);
        request.body = RequestBody::Json(bytes);
        Ok(request)
    }

    // ---- generic verbs ---------------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.build(Method::GET, path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(self.build_json(Method::POST, path, body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(self.build_json(Method::PUT, path, body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.build(Method::DELETE, path)).await
    }

    // ---- named operations ------------------------------------------------

    pub async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health").await
    }

    /// `platforms` is repeated once per entry; omitted when empty
    pub async fn search_products(
        &self,
        product_name: &str,
        platforms: &[String],
    ) -> Result<Vec<SearchResult>, ApiError> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("product_name", product_name);
        for platform in platforms {
            query.append_pair("platforms", platform);
        }
        self.get(&format!("/api/products/search?{}", query.finish())).await
    }

    pub async fn analyze_product(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, ApiError> {
        self.post("/api/analysis/analyze", request).await
    }

    pub async fn get_analysis(&self, product_id: i64) -> Result<AnalysisResult, ApiError> {
        self.get(&format!("/api/analysis/{product_id}")).await
    }

    pub async fn list_analyses(&self, limit: usize) -> Result<Vec<AnalysisResult>, ApiError> {
        self.get(&format!("/api/analysis/?limit={limit}")).await
    }

    pub async fn delete_analysis(&self, analysis_id: i64) -> Result<StatusMessage, ApiError> {
        self.delete(&format!("/api/analysis/{analysis_id}")).await
    }

    pub async fn clear_all_analyses(&self) -> Result<StatusMessage, ApiError> {
        self.delete("/api/analysis/").await
    }

    /// Synchronous scrape-and-analyze for a practice source
    pub async fn analyze_practice(
        &self,
        source: PracticeSource,
        query: &str,
    ) -> Result<PracticeSentimentSummary, ApiError> {
        let body = PracticeRequest {
            source,
            query: query.to_string(),
        };
        self.post("/api/scrape/analyze", &body).await
    }

    /// Multipart upload; no JSON content type so the transport can set the boundary
    pub async fn upload_reviews_file(
        &self,
        file: MultipartFile,
    ) -> Result<UploadAnalysisResponse, ApiError> {
        let mut request = self.build(Method::POST, "/api/products/upload");
        request.body = RequestBody::Multipart(file);
        self.execute(request).await
    }

    pub async fn get_product(&self, product_id: i64) -> Result<Product, ApiError> {
        self.get(&format!("/api/products/{product_id}")).await
    }

    pub async fn list_products(&self, limit: usize) -> Result<Vec<Product>, ApiError> {
        self.get(&format!("/api/products/?limit={limit}")).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

/// Fold a raw response into a value or a classified error.
///
/// HTML is checked before the status: a proxy or dev server error page means
/// the API itself is unreachable.
pub fn decode_response<T: DeserializeOwned>(
    response: &ApiResponse,
    base_url: &str,
) -> Result<T, ApiError> {
    if response.is_html() {
        return Err(ApiError::connectivity(
            format!("Backend server is not responding. Make sure the API server is running on {base_url}"),
            Some(format!("received text/html with status {}", response.status)),
        ));
    }

    if !response.is_success() {
        return Err(ApiError::request(response.status, error_message(response)));
    }

    serde_json::from_slice(&response.body)
        .map_err(|e| ApiError::decode(INVALID_RESPONSE_MESSAGE, Some(e.to_string())))
}

/// `detail`, then `message`, then the status text
fn error_message(response: &ApiResponse) -> String {
    serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|body| message_field(&body, "detail").or_else(|| message_field(&body, "message")))
        .unwrap_or_else(|| status_fallback(response))
}

fn message_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        // FastAPI validation errors put a list here
        other => Some(other.to_string()),
    }
}

fn status_fallback(response: &ApiResponse) -> String {
    if response.status_text.trim().is_empty() {
        format!("Request failed with status {}", response.status)
    } else {
        response.status_text.clone()
    }
}
