//! 配置管理

use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_CODE_TTL_HOURS;
use crate::errors::{LedgerError, Result};

/// 有效期上限（小时），约 100 年
pub const MAX_CODE_TTL_HOURS: i64 = 24 * 365 * 100;

/// 默认台账文件位置
pub const DEFAULT_LEDGER_PATH: &str = "data/access_codes.json";

/// 存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON 文件
    #[default]
    Json,
    /// SQLite 数据库
    Sqlite,
    /// 内存（进程退出即丢失）
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(StoreBackend::Json),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Unknown store backend: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Json => write!(f, "json"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// 台账配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// 台账存储位置
    pub ledger_path: PathBuf,
    /// 存储后端
    pub backend: StoreBackend,
    /// 访问码有效期（小时）
    pub code_ttl_hours: i64,
}

impl LedgerConfig {
    pub fn new(ledger_path: impl Into<PathBuf>, backend: StoreBackend) -> Self {
        Self {
            ledger_path: ledger_path.into(),
            backend,
            code_ttl_hours: DEFAULT_CODE_TTL_HOURS,
        }
    }

    /// 设置有效期
    pub fn with_code_ttl_hours(mut self, hours: i64) -> Self {
        self.code_ttl_hours = hours;
        self
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.code_ttl_hours <= 0 {
            return Err(LedgerError::ConfigError(format!(
                "code_ttl_hours must be positive, got {}",
                self.code_ttl_hours
            )));
        }
        if self.code_ttl_hours > MAX_CODE_TTL_HOURS {
            return Err(LedgerError::ConfigError(format!(
                "code_ttl_hours must be at most {}, got {}",
                MAX_CODE_TTL_HOURS, self.code_ttl_hours
            )));
        }
        if self.backend != StoreBackend::Memory && self.ledger_path.as_os_str().is_empty() {
            return Err(LedgerError::ConfigError(
                "ledger_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// 访问码有效期
    pub fn code_ttl(&self) -> Duration {
        Duration::hours(self.code_ttl_hours)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_PATH, StoreBackend::Json)
    }
}
