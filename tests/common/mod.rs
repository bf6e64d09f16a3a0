//! Scripted transport shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use smartmarket_client_lib::infrastructure::{
    ApiClient, ApiRequest, ApiResponse, HttpTransport, Session, TransportError,
};

pub const BASE_URL: &str = "http://backend.test";

type Handler = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

/// Answers every request with a closure and records what was sent
pub struct FakeTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> ApiRequest {
        self.requests().pop().expect("no request was sent")
    }

    /// Requests with `method` whose path (after the base URL) equals `path`
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && path_of(r) == path)
            .count()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(&request)
    }
}

pub fn path_of(request: &ApiRequest) -> &str {
    request.url.strip_prefix(BASE_URL).unwrap_or(&request.url)
}

pub fn client(transport: &Arc<FakeTransport>) -> ApiClient {
    client_with_session(transport, Session::in_memory())
}

pub fn client_with_session(transport: &Arc<FakeTransport>, session: Session) -> ApiClient {
    let transport: Arc<dyn HttpTransport> = transport.clone();
    ApiClient::new(BASE_URL, transport, session)
}

pub fn json(status: u16, body: Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse {
        status,
        status_text: status_text(status).to_string(),
        content_type: Some("application/json".to_string()),
        body: body.to_string().into_bytes(),
    })
}

pub fn html(status: u16) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse {
        status,
        status_text: status_text(status).to_string(),
        content_type: Some("text/html; charset=utf-8".to_string()),
        body: b"<!DOCTYPE html><html><body>Bad Gateway</body></html>".to_vec(),
    })
}

pub fn not_found() -> Result<ApiResponse, TransportError> {
    json(404, serde_json::json!({"detail": "Analysis not found"}))
}

pub fn refused() -> Result<ApiResponse, TransportError> {
    Err(TransportError::Connect("connection refused".to_string()))
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "",
    }
}

/// Counter for "succeed on the n-th call" scripts
#[derive(Default)]
pub struct Calls(AtomicUsize);

impl Calls {
    /// 1-based number of this call
    pub fn next(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

pub fn analysis_json(id: i64, product_id: i64, name: &str) -> Value {
    serde_json::json!({
        "id": id,
        "product_id": product_id,
        "product_name": name,
        "product_price": 49.99,
        "avg_sentiment": 0.74,
        "sentiment_label": "positive",
        "total_reviews": 20,
        "positive_count": 14,
        "neutral_count": 4,
        "negative_count": 2,
        "keywords": ["battery", "screen"],
        "price_data": {"amazon": 49.99, "ebay": 44.5},
        "analyzed_at": "2024-06-01T10:30:00Z"
    })
}

pub fn accepted_json(product_id: i64, url: &str) -> Value {
    serde_json::json!({
        "status": "processing",
        "message": "Analysis started",
        "product_id": product_id,
        "product_url": url,
        "platform": "amazon"
    })
}

pub fn body_json(request: &ApiRequest) -> Value {
    match &request.body {
        smartmarket_client_lib::infrastructure::RequestBody::Json(bytes) => {
            serde_json::from_slice(bytes).expect("request body is not JSON")
        }
        other => panic!("expected JSON body, got {other:?}"),
    }
}
