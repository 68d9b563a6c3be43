use thiserror::Error;

pub type ScanResult<T> = Result<T, ScanError>;

/// 扫码核心的异常路径。
///
/// `NOT_FOUND` / `NO_INVOICE` / `FALSE` 等业务结果不在此列，它们是结果记录里的判别值。
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("catalog not loaded")]
    CatalogNotLoaded,
    #[error("empty scan value: {0}")]
    EmptyInput(&'static str),
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("feature disabled: {0}")]
    FeatureDisabled(&'static str),
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("defect ledger is empty")]
    EmptyLedger,
    #[error("export failed: {0}")]
    Export(String),
}

impl ScanError {
    pub fn invalid_catalog(message: impl Into<String>) -> Self {
        Self::InvalidCatalog(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::Export(message.into())
    }
}
