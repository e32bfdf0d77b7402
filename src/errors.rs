//! 标准化错误处理
//!
//! 定义台账专用的错误类型。兑换失败（过期、无效、已授权）不是错误，
//! 见 [`crate::domain::VerifyReason`]。

use thiserror::Error;

/// 台账主要错误类型
#[derive(Error, Debug)]
pub enum LedgerError {
    /// 存储不可用（权限、I/O 故障），调用方可重试
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// 存储内容无法解析，需人工介入，不自动修复
    #[error("Store unavailable: malformed ledger: {0}")]
    MalformedStore(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LedgerError {
    /// 是否属于存储不可用（包含格式损坏）
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            LedgerError::StoreUnavailable(_) | LedgerError::MalformedStore(_)
        )
    }

    /// 调用方是否可以直接重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::StoreUnavailable(_))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            LedgerError::StoreUnavailable(err.to_string())
        } else {
            LedgerError::MalformedStore(err.to_string())
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => {
                LedgerError::MalformedStore(err.to_string())
            }
            other => LedgerError::StoreUnavailable(other.to_string()),
        }
    }
}

/// 项目结果类型别名
pub type Result<T> = std::result::Result<T, LedgerError>;
