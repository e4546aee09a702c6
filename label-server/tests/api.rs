mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::MockPrinter;
use http_body_util::BodyExt;
use label_server::{Config, ServerState, api};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(printer: &MockPrinter, work_dir: &tempfile::TempDir) -> (Router, ServerState) {
    let config = Config::with_overrides(work_dir.path().to_string_lossy(), 0);
    let state = ServerState::with_driver(&config, Arc::new(printer.clone()));
    (api::build_router(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, value)
}

#[tokio::test]
async fn test_health_and_layouts() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(&MockPrinter::new(), &dir);

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["printerConnected"], false);

    let (status, body) = send(&app, "GET", "/layouts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["defaultLayout"], "default");
    let ids: Vec<&str> = body["layouts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"triple-30x20"));
}

#[tokio::test]
async fn test_connect_print_and_poll() {
    let dir = tempfile::tempdir().unwrap();
    let printer = MockPrinter::new();
    let (app, state) = app(&printer, &dir);

    let (_, body) = send(&app, "GET", "/printers", None).await;
    let first = &body["printers"][0];
    assert_eq!(first["vendorId"], 0x1203);

    let (status, body) = send(
        &app,
        "POST",
        "/printers/connect",
        Some(json!({ "vendorId": first["vendorId"], "productId": first["productId"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(dir.path().join("printer.json").exists());

    let (_, body) = send(&app, "GET", "/printers/status", None).await;
    assert_eq!(body["status"]["connected"], true);

    let (status, body) = send(
        &app,
        "POST",
        "/print",
        Some(json!({
            "pageConfig": "default",
            "label": {
                "qrData": "https://example.com/product/ABC-123",
                "title": "PRODUCT-ABC-123",
                "subtitle": "Batch: 2026-01-15"
            },
            "quantity": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["job"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["job"]["payload"]["label"]["layoutKind"], "qr");

    common::wait_for(&state.queue, &id, label_server::JobStatus::Completed).await;
    let (_, body) = send(&app, "GET", &format!("/jobs/{}", id), None).await;
    assert_eq!(body["job"]["status"], "completed");

    let (status, body) = send(&app, "GET", &format!("/jobs/{}/tspl", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("QRCODE"));

    let (_, body) = send(&app, "GET", "/queue/stats", None).await;
    assert_eq!(body["stats"]["completed"], 1);

    let (_, body) = send(&app, "POST", "/queue/clear", None).await;
    assert_eq!(body["removed"], 1);

    let (_, body) = send(&app, "POST", "/printers/disconnect", None).await;
    assert_eq!(body["success"], true);
    assert!(!dir.path().join("printer.json").exists());
}

#[tokio::test]
async fn test_errors_map_to_status_codes() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(&MockPrinter::new(), &dir);

    let (status, body) = send(
        &app,
        "POST",
        "/print",
        Some(json!({ "label": { "subtitle": "no title" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/print",
        Some(json!({ "pageConfig": "unknown", "label": { "title": "A" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/jobs/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(&app, "GET", "/jobs?status=lost", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/jobs?limit=many", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");

    let (_, body) = send(&app, "GET", "/queue/stats", None).await;
    assert_eq!(body["stats"]["total"], 0);
}

#[tokio::test]
async fn test_malformed_body_uses_error_body() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(&MockPrinter::new(), &dir);

    let request = Request::builder()
        .method("POST")
        .uri("/print")
        .header("content-type", "application/json")
        .body(Body::from("{\"label\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION");

    let (status, body) = send(&app, "POST", "/print", Some(json!({ "label": 7 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, "POST", "/printers/connect", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn test_delete_and_list_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app(&MockPrinter::new(), &dir);

    let (status, body) = send(
        &app,
        "POST",
        "/print/custom",
        Some(json!({ "tspl": "CLS\r\nPRINT 1,1\r\n" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["job"]["id"].as_str().unwrap().to_string();

    // no printer was ever connected
    common::wait_for(&state.queue, &id, label_server::JobStatus::Failed).await;

    let (_, body) = send(&app, "GET", "/jobs?status=failed&limit=5", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["jobs"][0]["id"], id.as_str());

    let (_, body) = send(&app, "POST", &format!("/jobs/{}/cancel", id), None).await;
    assert_eq!(body["cancelled"], false);

    let (status, body) = send(&app, "DELETE", &format!("/jobs/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (_, body) = send(&app, "GET", "/jobs", None).await;
    assert_eq!(body["count"], 0);
}
