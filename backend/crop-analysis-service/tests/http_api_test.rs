//! HTTP API tests against the in-memory store and a mock model provider

use actix_web::{test, web, App};
use async_trait::async_trait;
use crop_analysis_service::{
    handlers, AnalysisGateway, AnalysisRecord, AppState, GatewayConfig, HistoryLimits,
    InMemoryResultStore, NewAnalysisRecord, ResultStore, SharedResultStore, StoreError,
    MAX_IMAGE_BYTES,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Store whose writes always fail
struct BrokenStore;

#[async_trait]
impl ResultStore for BrokenStore {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn insert_record(&self, _record: NewAnalysisRecord) -> Result<AnalysisRecord, StoreError> {
        Err(StoreError::Corrupt("disk on fire".to_string()))
    }

    async fn list_recent(&self, _limit: usize) -> Result<Vec<AnalysisRecord>, StoreError> {
        Ok(Vec::new())
    }
}

fn build_state(server: &MockServer, api_key: Option<&str>, store: SharedResultStore) -> AppState {
    let gateway = AnalysisGateway::new(GatewayConfig {
        api_key: api_key.map(str::to_string),
        endpoint: format!("{}{}", server.uri(), COMPLETIONS_PATH),
        model: "test/vision-model".to_string(),
        timeout: Duration::from_secs(5),
    })
    .expect("gateway");

    AppState {
        gateway,
        store,
        history: HistoryLimits {
            default_limit: 10,
            max_limit: 20,
        },
    }
}

async fn mount_analysis(server: &MockServer) {
    let arguments = json!({
        "cropType": "Potato",
        "defects": [{
            "name": "Late Blight",
            "description": "Water-soaked lesions with white mould",
            "affectedArea": "leaves and stems"
        }],
        "severity": "Critical",
        "confidenceScore": 88.4,
        "recommendations": "Destroy infected plants"
    });
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "tool_calls": [{
                "type": "function",
                "function": { "name": "analyze_crop", "arguments": arguments.to_string() }
            }]}}]
        })))
        .mount(server)
        .await;
}

fn record_body(crop_type: &str, confidence: f64) -> Value {
    json!({
        "cropType": crop_type,
        "defects": [{"name": "Rust", "description": "Orange pustules", "affectedArea": "5%"}],
        "severity": "Medium",
        "confidenceScore": confidence,
        "recommendations": "Not stored"
    })
}

#[actix_web::test]
async fn health_reports_store_backend() {
    let server = MockServer::start().await;
    let state = build_state(&server, None, Arc::new(InMemoryResultStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["gatewayConfigured"], false);
}

#[actix_web::test]
async fn analyze_returns_result_without_persisting() {
    let server = MockServer::start().await;
    mount_analysis(&server).await;
    let store = Arc::new(InMemoryResultStore::new());
    let state = build_state(&server, Some("test-key"), store.clone());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/analyze")
        .set_json(json!({ "image": "data:image/jpeg;base64,/9j/4AAQ" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["cropType"], "Potato");
    assert_eq!(body["severity"], "Critical");
    assert_eq!(body["recommendations"], "Destroy infected plants");
    assert!(store.is_empty().await);
}

#[actix_web::test]
async fn analyze_without_image_is_validation_error() {
    let server = MockServer::start().await;
    let state = build_state(&server, Some("test-key"), Arc::new(InMemoryResultStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/analyze")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["reason"], "missing_image");
}

#[actix_web::test]
async fn analyze_without_credential_is_unavailable() {
    let server = MockServer::start().await;
    let state = build_state(&server, None, Arc::new(InMemoryResultStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/analyze")
        .set_json(json!({ "image": "data:image/png;base64,aGVsbG8=" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "config_error");
    assert!(!body["message"].as_str().unwrap_or_default().contains("API key"));
}

#[actix_web::test]
async fn pipeline_persists_and_lists_analysis() {
    let server = MockServer::start().await;
    mount_analysis(&server).await;
    let state = build_state(&server, Some("test-key"), Arc::new(InMemoryResultStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/analyses")
        .insert_header(("content-type", "image/jpeg"))
        .set_payload(vec![0xff, 0xd8, 0xff, 0xe0])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["result"]["cropType"], "Potato");
    let record: AnalysisRecord =
        serde_json::from_value(body["record"].clone()).expect("record");
    assert_eq!(record.confidence_score, 88.4);
    assert!(record.image_url.is_none());

    let req = test::TestRequest::get()
        .uri("/api/v1/records?limit=1")
        .to_request();
    let history: Vec<AnalysisRecord> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(history, vec![record]);
}

#[actix_web::test]
async fn pipeline_returns_result_when_store_fails() {
    let server = MockServer::start().await;
    mount_analysis(&server).await;
    let state = build_state(&server, Some("test-key"), Arc::new(BrokenStore));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/analyses")
        .insert_header(("content-type", "image/png"))
        .set_payload(vec![1, 2, 3])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["result"]["cropType"], "Potato");
    assert!(body["record"].is_null());
}

#[actix_web::test]
async fn pipeline_surfaces_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;
    let store = Arc::new(InMemoryResultStore::new());
    let state = build_state(&server, Some("test-key"), store.clone());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/analyses")
        .insert_header(("content-type", "image/png"))
        .set_payload(vec![1, 2, 3])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 429);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "rate_limit_error");
    assert!(store.is_empty().await);
}

#[actix_web::test]
async fn pipeline_rejects_oversized_image() {
    let server = MockServer::start().await;
    let state = build_state(&server, Some("test-key"), Arc::new(InMemoryResultStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/analyses")
        .insert_header(("content-type", "image/png"))
        .set_payload(vec![0u8; MAX_IMAGE_BYTES + 1])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["reason"], "too_large");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[actix_web::test]
async fn empty_image_is_rejected_before_provider_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let store = Arc::new(InMemoryResultStore::new());
    let state = build_state(&server, Some("test-key"), store.clone());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/analyses")
        .insert_header(("content-type", "image/png"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["reason"], "missing_image");

    let req = test::TestRequest::post()
        .uri("/api/v1/analyze")
        .set_json(json!({ "image": "data:image/png;base64," }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["reason"], "missing_image");

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    assert!(store.is_empty().await);
}

#[actix_web::test]
async fn records_append_and_list_newest_first() {
    let server = MockServer::start().await;
    let state = build_state(&server, None, Arc::new(InMemoryResultStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    for crop in ["Wheat", "Rice", "Corn"] {
        let req = test::TestRequest::post()
            .uri("/api/v1/records")
            .set_json(record_body(crop, 70.0))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
    }

    let req = test::TestRequest::get().uri("/api/v1/records").to_request();
    let history: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    let crops: Vec<&str> = history
        .iter()
        .map(|r| r["cropType"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(crops, ["Corn", "Rice", "Wheat"]);
    assert!(history.iter().all(|r| r.get("recommendations").is_none()));
}

#[actix_web::test]
async fn records_reject_invalid_input() {
    let server = MockServer::start().await;
    let state = build_state(&server, None, Arc::new(InMemoryResultStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/records")
        .set_json(record_body("Tomato", 150.0))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["reason"], "invalid_confidence");

    let req = test::TestRequest::post()
        .uri("/api/v1/records")
        .set_json(record_body("Barley", 50.0))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::get()
        .uri("/api/v1/records?limit=many")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn no_update_or_delete_routes() {
    let server = MockServer::start().await;
    let state = build_state(&server, None, Arc::new(InMemoryResultStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::delete().uri("/api/v1/records").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 405);

    let req = test::TestRequest::patch().uri("/api/v1/records").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 405);
}
