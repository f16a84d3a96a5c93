//! Gateway behavior against an in-memory backend

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use sitetrack_core::{ProgressEntry, ProjectConfig};
use sitetrack_gateway::{
    BatchReceipt, Gateway, GatewayError, RawResponse, Request, ResetGate, Transport,
};

/// Replays canned responses and records every request
#[derive(Debug, Default)]
struct FakeBackend {
    responses: Mutex<VecDeque<RawResponse>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeBackend {
    fn replying(bodies: &[serde_json::Value]) -> Self {
        let backend = Self::default();
        for body in bodies {
            backend.push(RawResponse::ok(body.to_string()));
        }
        backend
    }

    fn push(&self, response: RawResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: &Request) -> Result<RawResponse, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| RawResponse::ok(r#"{"status":"OK"}"#)))
    }
}

#[tokio::test]
async fn fetch_config_uses_get_with_cache_bust() {
    let backend = FakeBackend::replying(&[json!({
        "status": "OK",
        "data": {
            "Proyecto": "Residencial Norte",
            "Torres": ["A", "B"],
            "PisosPorTorre": [12, 8],
            "Actividades": ["Paint", "Tiles"]
        }
    })]);
    let gateway = Gateway::new(backend);

    let config = gateway.fetch_config().await.unwrap();

    assert_eq!(config.name, "Residencial Norte");
    assert_eq!(config.floor_count("A"), 12);
    assert_eq!(config.floor_count("B"), 8);

    match &gateway.transport().requests()[..] {
        [Request::Get { action, cache_bust }] => {
            assert_eq!(action, "getConfig");
            assert!(*cache_bust > 0);
        }
        other => panic!("unexpected requests: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_progress_decodes_rows() {
    let backend = FakeBackend::replying(&[json!({
        "status": "OK",
        "data": [
            { "Timestamp": "2025-03-01T08:00:00Z", "Usuario": "ana", "Torre": "A",
              "Piso": "1", "Actividad": "Paint", "Avance": "100" },
            { "Timestamp": "2025-03-02T08:00:00Z", "Usuario": "ana", "Torre": "A",
              "Piso": 2, "Actividad": "Paint", "Avance": "n/a" }
        ]
    })]);
    let gateway = Gateway::new(backend);

    let records = gateway.fetch_progress().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].percent, 100);
    assert_eq!(records[0].floor, 1);
}

#[tokio::test]
async fn batch_is_one_request() {
    let backend = FakeBackend::replying(&[json!({ "status": "OK", "data": { "saved": 2 } })]);
    let gateway = Gateway::new(backend);
    let entries = vec![
        ProgressEntry::new("ana", "A", 1, "Paint", 40),
        ProgressEntry::new("ana", "A", 2, "Paint", 60),
    ];

    let receipt = gateway.save_progress(&entries).await.unwrap();

    assert_eq!(receipt, BatchReceipt { saved: 2 });
    let requests = gateway.transport().requests();
    assert_eq!(requests.len(), 1);
    match &requests[0] {
        Request::Post { body } => {
            assert_eq!(body["action"], "saveProgress");
            assert_eq!(body["rows"].as_array().map(Vec::len), Some(2));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[tokio::test]
async fn receipt_defaults_to_batch_size() {
    let gateway = Gateway::new(FakeBackend::default());
    let entries = vec![ProgressEntry::new("ana", "A", 1, "Paint", 40)];
    assert_eq!(gateway.save_progress(&entries).await.unwrap().saved, 1);
}

#[tokio::test]
async fn empty_batch_sends_nothing() {
    let gateway = Gateway::new(FakeBackend::default());
    let receipt = gateway.save_progress(&[]).await.unwrap();
    assert_eq!(receipt.saved, 0);
    assert!(gateway.transport().requests().is_empty());
}

#[tokio::test]
async fn failed_batch_reports_backend_message() {
    let backend = FakeBackend::replying(&[json!({
        "status": "ERROR",
        "message": "Sheet 'Avances' is protected"
    })]);
    let gateway = Gateway::new(backend);
    let entries = vec![ProgressEntry::new("ana", "A", 1, "Paint", 40)];

    let err = gateway.save_progress(&entries).await.unwrap_err();
    assert_eq!(err.to_string(), "Backend error: Sheet 'Avances' is protected");
}

#[tokio::test]
async fn save_config_posts_canonical_shape() {
    let gateway = Gateway::new(FakeBackend::default());
    let config = ProjectConfig::new("Obra")
        .tower("A", 3)
        .activity("Paint");

    gateway.save_config(&config).await.unwrap();

    match &gateway.transport().requests()[..] {
        [Request::Post { body }] => {
            assert_eq!(body["action"], "saveConfig");
            assert_eq!(body["config"]["Torres"], json!(["A"]));
            assert_eq!(body["config"]["PisosPorTorre"], json!([3]));
        }
        other => panic!("unexpected requests: {other:?}"),
    }
}

#[tokio::test]
async fn http_error_surfaces_status() {
    let backend = FakeBackend::default();
    backend.push(RawResponse {
        status: 500,
        reason: "Internal Server Error".into(),
        body: String::new(),
    });
    let gateway = Gateway::new(backend);

    match gateway.fetch_config().await {
        Err(GatewayError::Network { status, .. }) => assert_eq!(status, 500),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn html_login_page_is_malformed() {
    let backend = FakeBackend::default();
    backend.push(RawResponse::ok("<!DOCTYPE html><html>Sign in</html>"));
    let gateway = Gateway::new(backend);

    assert!(matches!(
        gateway.fetch_progress().await,
        Err(GatewayError::MalformedResponse)
    ));
}

#[tokio::test]
async fn reset_requires_confirmation() {
    let gateway = Gateway::new(FakeBackend::default());
    let gate = ResetGate::new(Some("borrar".to_string()));

    // a mismatch never reaches the backend
    assert!(gate.confirm("borra").is_err());
    assert!(gateway.transport().requests().is_empty());

    let token = gate.confirm("borrar").unwrap();
    gateway.reset_project(token).await.unwrap();

    match &gateway.transport().requests()[..] {
        [Request::Post { body }] => assert_eq!(body, &json!({ "action": "resetProject" })),
        other => panic!("unexpected requests: {other:?}"),
    }
}
