use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub lookahead: LookaheadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// 部署档位：决定发票号的条码形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceProfile {
    /// 纯数字，长度 >= 10
    Numeric,
    /// 两位字母前缀 + 至少 10 位数字
    Prefixed,
}

impl InvoiceProfile {
    pub fn pattern(self) -> &'static str {
        match self {
            InvoiceProfile::Numeric => r"^\d{10,}$",
            InvoiceProfile::Prefixed => r"^[A-Za-z]{2}\d{10,}$",
        }
    }
}

/// 扫码识别配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// 档位；invoice_pattern 优先
    #[serde(default)]
    pub profile: Option<InvoiceProfile>,
    /// 自定义发票号正则
    #[serde(default)]
    pub invoice_pattern: Option<String>,
    /// 商品码归一化正则（需包含一个捕获组）
    #[serde(default)]
    pub code_pattern: Option<String>,
    /// 归一化后拼接在捕获组前的前缀
    #[serde(default)]
    pub code_prefix: String,
}

impl ScanConfig {
    /// 实际生效的发票号正则
    pub fn effective_invoice_pattern(&self) -> &str {
        match (&self.invoice_pattern, self.profile) {
            (Some(p), _) => p.as_str(),
            (None, Some(profile)) => profile.pattern(),
            (None, None) => InvoiceProfile::Numeric.pattern(),
        }
    }
}

/// 可选能力开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub defects: bool,
    pub incoming: bool,
    pub run_length_hints: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            defects: true,
            incoming: true,
            run_length_hints: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookaheadConfig {
    /// 跨发票预测时跳过连续长度 >= 该值的明细
    pub skip_run_length_at: Option<u32>,
}

impl AppConfig {
    /// 加载配置：默认值 -> pickscan.toml (可选) -> PICKSCAN__* 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        Config::builder()
            .set_default("server.host", host)?
            .set_default("server.port", i64::from(port))?
            .add_source(File::with_name("pickscan").required(false))
            .add_source(
                Environment::with_prefix("PICKSCAN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
