use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pickscan_rust::api::{self, AppState};
use pickscan_rust::service::BroadcastFeedback;
use pickscan_rust::{AppConfig, ScanService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let events = BroadcastFeedback::new(16);
    let service = Arc::new(ScanService::new(&AppConfig::default(), Arc::new(events.clone())).unwrap());
    api::router(AppState { service, events })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn load_catalog(app: &Router) {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/catalog",
        Some(json!({
            "invoices": [
                {"id": "1234567890", "items": [{"code": "A1", "quantity": 1}]},
                {"id": "1234567891", "items": [{"code": "C1", "quantity": 2}]}
            ],
            "products": [{"code": "A1", "name": "Basic tee", "option": "White/L"}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoices"], 2);
    assert_eq!(body["line_items"], 2);
}

#[tokio::test]
async fn health_check_responds() {
    let (status, bytes) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"OK");
}

#[tokio::test]
async fn scanning_before_catalog_is_a_conflict() {
    let app = app();
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/stations/st/scan",
        Some(json!({"value": "1234567890"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn scan_flow_returns_full_snapshots() {
    let app = app();
    load_catalog(&app).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/stations/st/scan",
        Some(json!({"value": "1234567890"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "INVOICE");
    assert_eq!(body["result"], "OK");
    assert_eq!(body["items"][0]["code"], "A1");
    assert_eq!(body["preview"]["code"], "A1");

    let (_, body) = send_json(
        &app,
        "POST",
        "/api/stations/st/scan",
        Some(json!({"value": "WRONG"})),
    )
    .await;
    assert_eq!(body["kind"], "ITEM");
    assert_eq!(body["result"], "FALSE");
    assert_eq!(body["events"], json!(["ITEM_WRONG"]));

    let (_, body) = send_json(
        &app,
        "POST",
        "/api/stations/st/item",
        Some(json!({"code": "A1"})),
    )
    .await;
    assert_eq!(body["result"], "TRUE");
    assert_eq!(body["invoice_done"], true);
    assert_eq!(body["name"], "Basic tee");
    assert_eq!(body["preview"]["invoice_id"], "1234567891");
    assert_eq!(body["preview"]["other_invoice"], true);

    let (_, body) = send_json(&app, "GET", "/api/stations/st/status", None).await;
    assert_eq!(body["current_invoice"], "1234567890");
    assert_eq!(body["invoice_done"], true);
}

#[tokio::test]
async fn blank_code_is_a_bad_request() {
    let app = app();
    load_catalog(&app).await;
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/stations/st/item",
        Some(json!({"code": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn defect_endpoints_and_export() {
    let app = app();
    load_catalog(&app).await;

    let (status, _) = send(&app, "GET", "/api/defects/export", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send_json(&app, "POST", "/api/stations/st/invoice", Some(json!({"invoice_id": "1234567891"}))).await;
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/stations/st/defects/add",
        Some(json!({"code": "C1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["defect_count"], 1);
    assert_eq!(body["items"][0]["remain"], 1);
    send_json(&app, "POST", "/api/stations/st/defects/add", Some(json!({"code": "A1"}))).await;

    let (_, body) = send_json(&app, "GET", "/api/defects", None).await;
    assert_eq!(body[0]["code"], "C1");
    assert_eq!(body[1]["name"], "Basic tee");

    let (status, bytes) = send(&app, "GET", "/api/defects/export", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("code,name,option,count"));
    assert!(text.contains("A1,Basic tee,White/L,1"));

    let (_, body) = send_json(
        &app,
        "POST",
        "/api/stations/st/defects/remove",
        Some(json!({"code": "C1"})),
    )
    .await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["items"][0]["remain"], 2);
    assert_eq!(body["defects"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_catalog_is_rejected() {
    let app = app();
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/catalog",
        Some(json!({"invoices": [{"id": "1", "items": [{"code": "A1", "quantity": 0}]}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
