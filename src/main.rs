use pickscan_rust::api::{self, AppState};
use pickscan_rust::service::{BroadcastFeedback, FanoutFeedback, LogFeedback};
use pickscan_rust::{AppConfig, ScanService};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式，RUST_LOG 控制级别
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    // 反馈事件：日志 + SSE 广播
    let events = BroadcastFeedback::new(256);
    let feedback = FanoutFeedback::new()
        .with(Arc::new(LogFeedback))
        .with(Arc::new(events.clone()));

    let service = Arc::new(ScanService::new(&config, Arc::new(feedback))?);
    info!(
        "Invoice pattern: {}, features: {:?}",
        config.scan.effective_invoice_pattern(),
        config.features
    );

    let app = api::router(AppState { service, events }).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/catalog                          - load catalog");
    info!("  POST /api/stations/:station/scan           - classify + apply scan");
    info!("  GET  /api/stations/:station/status         - station snapshot");
    info!("  GET  /api/defects/export                   - defect CSV");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
