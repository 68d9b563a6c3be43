use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanKind {
    Invoice,
    Item,
}

/// 扫码分类：纯函数，不查目录
#[derive(Debug, Clone)]
pub struct ScanClassifier {
    invoice_pattern: Regex,
}

impl ScanClassifier {
    pub fn new(pattern: &str) -> ScanResult<Self> {
        Ok(Self {
            invoice_pattern: Regex::new(pattern)?,
        })
    }

    pub fn from_config(scan: &ScanConfig) -> ScanResult<Self> {
        Self::new(scan.effective_invoice_pattern())
    }

    /// 无当前发票时一律视为发票号；有当前发票时仅匹配发票号形态才切换发票
    pub fn classify(&self, raw: &str, has_active_invoice: bool) -> ScanKind {
        if !has_active_invoice || self.invoice_pattern.is_match(raw.trim()) {
            ScanKind::Invoice
        } else {
            ScanKind::Item
        }
    }
}

/// 商品码归一化：扫码枪输出常带前后缀，按配置的捕获组提取
#[derive(Debug, Clone, Default)]
pub struct CodeNormalizer {
    pattern: Option<Regex>,
    prefix: String,
}

impl CodeNormalizer {
    pub fn new(pattern: Option<&str>, prefix: &str) -> ScanResult<Self> {
        let pattern = match pattern {
            Some(p) => {
                let re = Regex::new(p)?;
                if re.captures_len() < 2 {
                    return Err(ScanError::invalid_config(format!(
                        "code pattern {} needs a capture group",
                        p
                    )));
                }
                Some(re)
            }
            None => None,
        };
        Ok(Self {
            pattern,
            prefix: prefix.to_string(),
        })
    }

    pub fn from_config(scan: &ScanConfig) -> ScanResult<Self> {
        Self::new(scan.code_pattern.as_deref(), &scan.code_prefix)
    }

    /// 不匹配时原样返回 (去除首尾空白)
    pub fn normalize(&self, raw: &str) -> String {
        let raw = raw.trim();
        self.pattern
            .as_ref()
            .and_then(|re| re.captures(raw))
            .and_then(|caps| caps.get(1))
            .map(|m| format!("{}{}", self.prefix, m.as_str()))
            .unwrap_or_else(|| raw.to_string())
    }
}
