pub mod handlers;

pub use handlers::*;

use axum::{
    routing::{get, post},
    Router,
};

/// 构建路由
pub fn router(state: AppState) -> Router {
    let station_routes = Router::new()
        .route("/api/stations/:station/scan", post(scan))
        .route("/api/stations/:station/invoice", post(activate_invoice))
        .route("/api/stations/:station/item", post(consume_item))
        .route("/api/stations/:station/status", get(status))
        .route("/api/stations/:station/events", get(station_events))
        .route("/api/stations/:station/defects/add", post(add_defect))
        .route("/api/stations/:station/defects/dec", post(decrement_defect))
        .route("/api/stations/:station/defects/remove", post(remove_defect));

    let floor_routes = Router::new()
        .route("/api/catalog", post(load_catalog))
        .route("/api/incoming", post(load_incoming))
        .route("/api/defects", get(list_defects))
        .route("/api/defects/export", get(export_defects));

    Router::new()
        .route("/health", get(health_check))
        .merge(station_routes)
        .merge(floor_routes)
        .with_state(state)
}
