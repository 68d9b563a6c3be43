pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use config::AppConfig;
pub use error::{ScanError, ScanResult};
pub use service::ScanService;
