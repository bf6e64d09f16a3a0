//! Practice, input dispatch, upload, identity and health flows

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::json;
use tokio_test::assert_ok;

use common::{
    accepted_json, analysis_json, body_json, client, client_with_session, json, path_of, refused,
    FakeTransport,
};
use smartmarket_client_lib::application::{
    AnalysisOrchestrator, AnalysisStatus, AuthService, BackendStatus, HealthMonitor,
    PracticeService, SearchFlow, SubmitOutcome, UploadFile, UploadService,
};
use smartmarket_client_lib::domain::{LoginCredentials, PracticeSource, RegistrationForm};
use smartmarket_client_lib::infrastructure::config::PollingConfig;
use smartmarket_client_lib::infrastructure::{ErrorKind, RequestBody, Session};

fn practice_summary() -> serde_json::Value {
    json!({
        "stars": 4.2, "sentiment_label": "positive", "avg_sentiment": 0.84,
        "total_reviews": 0, "positive_count": 0, "negative_count": 0,
        "neutral_count": 0, "keywords": [], "opinion_summary": "No reviews yet"
    })
}

#[tokio::test]
async fn practice_sends_the_canonical_query() {
    let transport = FakeTransport::new(|_| json(200, practice_summary()));
    let practice = PracticeService::new(client(&transport));

    let analysis = practice
        .analyze(PracticeSource::RottenTomatoes, " https://www.rottentomatoes.com/m/the-matrix ")
        .await
        .unwrap();

    assert_eq!(analysis.query, "the matrix");
    assert_eq!(
        body_json(&transport.last_request()),
        json!({"source": "rottentomatoes", "query": "the matrix"})
    );
    // synchronous flow: one request, no polling
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn practice_rejects_blank_input_locally() {
    let transport = FakeTransport::new(|_| json(200, practice_summary()));
    let practice = PracticeService::new(client(&transport));

    let err = practice.analyze(PracticeSource::Trustpilot, "   ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(transport.requests().is_empty());
}

fn dispatch_backend() -> Arc<FakeTransport> {
    FakeTransport::new(|request| match path_of(request) {
        "/api/analysis/analyze" => json(200, accepted_json(8, "https://www.amazon.com/dp/B01")),
        "/api/analysis/8" => json(200, analysis_json(1, 8, "Kindle")),
        path if path.starts_with("/api/products/search") => json(
            200,
            json!([{"name": "Kindle Paperwhite", "price": 139.99, "platform": "amazon",
                    "url": "https://www.amazon.com/dp/B01", "rating": 4.7}]),
        ),
        _ => json(404, json!({"detail": "not found"})),
    })
}

fn search_flow(transport: &Arc<FakeTransport>) -> SearchFlow {
    let api = client(transport);
    let orchestrator = Arc::new(AnalysisOrchestrator::new(api.clone(), PollingConfig::default()));
    SearchFlow::new(api, orchestrator, "amazon")
}

#[tokio::test(start_paused = true)]
async fn urls_go_to_the_orchestrator_with_default_platform() {
    let transport = dispatch_backend();
    let flow = search_flow(&transport);

    let outcome = flow.submit("amazon.com/dp/B01", None).await.unwrap();
    let SubmitOutcome::Analysis(handle) = outcome else {
        panic!("expected an analysis");
    };
    let state = handle.wait().await.unwrap();

    assert_eq!(state.status, AnalysisStatus::Succeeded);
    let submit = &transport.requests()[0];
    assert_eq!(
        body_json(submit),
        json!({"product_url": "amazon.com/dp/B01", "platform": "amazon"})
    );
}

#[tokio::test]
async fn names_go_to_search() {
    let transport = dispatch_backend();
    let flow = search_flow(&transport);

    let outcome = flow.submit("kindle paperwhite", Some("ebay")).await.unwrap();
    let SubmitOutcome::Search(results) = outcome else {
        panic!("expected search results");
    };
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].platform, "amazon");
    assert_eq!(transport.count(Method::POST, "/api/analysis/analyze"), 0);
}

#[tokio::test]
async fn empty_input_is_rejected() {
    let transport = dispatch_backend();
    let err = search_flow(&transport).submit("  ", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(transport.requests().is_empty());
}

fn upload_backend() -> Arc<FakeTransport> {
    FakeTransport::new(|_| {
        json(
            200,
            json!({
                "product_id": 11, "product_name": "Headphones", "stars": 3.5,
                "sentiment_label": "neutral", "avg_sentiment": 0.7, "total_reviews": 4,
                "positive_count": 2, "neutral_count": 1, "negative_count": 1,
                "keywords": ["bass"], "opinion_summary": "Mixed"
            }),
        )
    })
}

#[tokio::test]
async fn upload_validation_happens_before_the_network() {
    let transport = upload_backend();
    let upload = UploadService::new(client(&transport));

    let none = upload.upload(None).await.unwrap_err();
    assert_eq!(none.kind(), ErrorKind::Validation);

    let wrong = upload.upload(Some(UploadFile::new("reviews.pdf", b"%PDF".to_vec()))).await.unwrap_err();
    assert_eq!(wrong.message(), "Select a .json, .csv or .xlsx file");

    let empty = upload.upload(Some(UploadFile::new("reviews.csv", Vec::new()))).await.unwrap_err();
    assert_eq!(empty.kind(), ErrorKind::Validation);

    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn upload_sends_multipart_file_field() {
    let transport = upload_backend();
    let upload = UploadService::new(client(&transport));

    let response = upload
        .upload(Some(UploadFile::new("reviews.xlsx", vec![1, 2, 3])))
        .await
        .unwrap();
    assert_eq!(response.product_name, "Headphones");

    let request = transport.last_request();
    assert_eq!(path_of(&request), "/api/products/upload");
    let RequestBody::Multipart(file) = request.body else {
        panic!("expected multipart body");
    };
    assert_eq!(file.field_name, "file");
    assert_eq!(file.bytes, vec![1, 2, 3]);
}

fn auth_backend() -> Arc<FakeTransport> {
    FakeTransport::new(|request| match (request.method.clone(), path_of(request)) {
        (Method::POST, "/api/auth/register") => json(
            201,
            json!({"id": 1, "email": "ana@example.com", "username": "ana", "full_name": "Ana Perez",
                   "is_active": true, "is_admin": false}),
        ),
        (Method::POST, "/api/auth/login") => {
            if body_json(request)["password"] == "secret1" {
                json(200, json!({"access_token": "jwt-abc", "token_type": "bearer"}))
            } else {
                json(401, json!({"detail": "Incorrect email or password"}))
            }
        }
        (Method::GET, "/api/auth/me") => match request.header("Authorization") {
            Some("Bearer jwt-abc") => json(
                200,
                json!({"id": 1, "email": "ana@example.com", "username": "ana",
                       "full_name": "Ana Perez", "is_active": true, "is_admin": false}),
            ),
            _ => json(401, json!({"detail": "Could not validate credentials"})),
        },
        _ => json(404, json!({"detail": "not found"})),
    })
}

fn form(password: &str, confirm: &str) -> RegistrationForm {
    RegistrationForm {
        email: "ana@example.com".into(),
        username: "ana".into(),
        password: password.into(),
        confirm_password: confirm.into(),
        full_name: "Ana Perez".into(),
    }
}

#[tokio::test]
async fn register_validates_then_logs_in() {
    let transport = auth_backend();
    let session = Session::in_memory();
    let auth = AuthService::new(client_with_session(&transport, session.clone()));

    let err = auth.register(form("secret1", "secret2")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(transport.requests().is_empty());

    let user = auth.register(form("secret1", "secret1")).await.unwrap();
    assert_eq!(user.username, "ana");
    assert_eq!(session.token().as_deref(), Some("jwt-abc"));
    assert_eq!(transport.count(Method::POST, "/api/auth/login"), 1);
}

#[tokio::test]
async fn login_failure_keeps_session_empty() {
    let transport = auth_backend();
    let session = Session::in_memory();
    let auth = AuthService::new(client_with_session(&transport, session.clone()));

    let err = auth
        .login(&LoginCredentials {
            email: "ana@example.com".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Incorrect email or password");
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn restore_and_logout() {
    let transport = auth_backend();
    let session = Session::in_memory();
    let auth = AuthService::new(client_with_session(&transport, session.clone()));

    assert!(auth.restore().await.is_none());
    assert!(transport.requests().is_empty());

    session.set_token("jwt-abc").unwrap();
    assert_eq!(auth.restore().await.unwrap().full_name, "Ana Perez");

    assert_ok!(auth.logout());
    assert!(!auth.is_authenticated());

    session.set_token("expired").unwrap();
    assert!(auth.restore().await.is_none());
    assert!(session.token().is_none());
}

#[tokio::test(start_paused = true)]
async fn health_monitor_tracks_backend_status() {
    let up = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&up);
    let transport = FakeTransport::new(move |_| {
        if flag.load(Ordering::SeqCst) {
            json(200, json!({"status": "healthy"}))
        } else {
            refused()
        }
    });

    let monitor = HealthMonitor::spawn(client(&transport), Duration::from_secs(10));
    assert_eq!(monitor.status(), BackendStatus::Checking);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(monitor.status(), BackendStatus::Online);
    assert_eq!(transport.requests().len(), 1);

    up.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(monitor.status(), BackendStatus::Offline);
    assert_eq!(transport.requests().len(), 2);

    monitor.stop();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.requests().len(), 2);
}
