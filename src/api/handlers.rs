use crate::error::ScanError;
use crate::models::{CatalogLoad, IncomingLoad};
use crate::service::{export, BroadcastFeedback, ScanService, StationEvent};
use axum::{
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// 共享状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScanService>,
    pub events: BroadcastFeedback,
}

/// 请求体: 统一扫码
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub value: String,
}

/// 请求体: 发票号
#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    pub invoice_id: String,
}

/// 请求体: 商品码
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let status = match &self {
            ScanError::EmptyInput(_) | ScanError::InvalidCatalog(_) | ScanError::EmptyLedger => {
                StatusCode::BAD_REQUEST
            }
            ScanError::CatalogNotLoaded | ScanError::FeatureDisabled(_) => StatusCode::CONFLICT,
            ScanError::InvalidPattern(_) | ScanError::InvalidConfig(_) | ScanError::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorResponse {
            success: false,
            message: format!("Error: {}", self),
        };
        (status, Json(body)).into_response()
    }
}

fn respond<T: Serialize>(result: Result<T, ScanError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 载入目录
pub async fn load_catalog(State(state): State<AppState>, Json(req): Json<CatalogLoad>) -> Response {
    respond(state.service.load_catalog(req))
}

/// 载入入库库存
pub async fn load_incoming(
    State(state): State<AppState>,
    Json(req): Json<IncomingLoad>,
) -> Response {
    respond(state.service.load_incoming(req))
}

/// 统一扫码 (自动区分发票号/商品码)
pub async fn scan(
    State(state): State<AppState>,
    Path(station): Path<String>,
    Json(req): Json<ScanRequest>,
) -> Response {
    respond(state.service.scan(&station, &req.value))
}

pub async fn activate_invoice(
    State(state): State<AppState>,
    Path(station): Path<String>,
    Json(req): Json<InvoiceRequest>,
) -> Response {
    respond(state.service.activate_invoice(&station, &req.invoice_id))
}

pub async fn consume_item(
    State(state): State<AppState>,
    Path(station): Path<String>,
    Json(req): Json<CodeRequest>,
) -> Response {
    respond(state.service.consume_item(&station, &req.code))
}

pub async fn status(State(state): State<AppState>, Path(station): Path<String>) -> Response {
    respond(state.service.status(&station))
}

pub async fn add_defect(
    State(state): State<AppState>,
    Path(station): Path<String>,
    Json(req): Json<CodeRequest>,
) -> Response {
    respond(state.service.add_defect(&station, &req.code))
}

pub async fn decrement_defect(
    State(state): State<AppState>,
    Path(station): Path<String>,
    Json(req): Json<CodeRequest>,
) -> Response {
    respond(state.service.decrement_defect(&station, &req.code))
}

pub async fn remove_defect(
    State(state): State<AppState>,
    Path(station): Path<String>,
    Json(req): Json<CodeRequest>,
) -> Response {
    respond(state.service.remove_defect(&station, &req.code))
}

pub async fn list_defects(State(state): State<AppState>) -> Response {
    respond(state.service.defects())
}

/// 导出不良台账 CSV
pub async fn export_defects(State(state): State<AppState>) -> Response {
    match state.service.export_defects() {
        Ok(bytes) => {
            let file_name = export::export_file_name(chrono::Local::now());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file_name),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// 工位反馈事件流 (SSE)
pub async fn station_events(
    State(state): State<AppState>,
    Path(station): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.events.subscribe();
    Sse::new(station_stream(rx, station)).keep_alive(KeepAlive::default())
}

fn station_stream(
    rx: broadcast::Receiver<StationEvent>,
    station: String,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    stream::unfold((rx, station), |(mut rx, station)| async move {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.station == station => {
                    let event = Event::default().event("feedback").json_data(&ev);
                    return Some((event, (rx, station)));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Station {} event stream lagged, {} events dropped", station, skipped);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}
