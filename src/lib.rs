//! 访问码台账
//!
//! 签发限时访问码、让恰好一个用户兑换，并记录已授权的用户：
//! - 访问码生成（8 位大写字母数字，默认 24 小时有效）
//! - 访问码兑换（过期清理 + 一次性兑换，并发安全）
//! - 授权查询与有效访问码列表
//!
//! # 架构分层
//!
//! - `domain`: 领域模型（访问码、台账）
//! - `core`: 核心层，时钟、配置和存储抽象
//! - `infrastructure`: 基础设施层，日志、存储实现和 HTTP 服务
//! - `application`: 应用层，台账服务

pub mod domain;

pub mod core;

pub mod infrastructure;

pub mod application;

pub mod errors;

pub use application::{AccessLedger, IssuedCode};
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::config::{LedgerConfig, StoreBackend};
pub use crate::core::store::{LedgerStore, MemoryStore};
pub use domain::{AccessCode, Ledger, Verification, VerifyReason};
pub use errors::{LedgerError, Result};
pub use infrastructure::logger;
pub use infrastructure::store::{open_store, JsonFileStore, SqliteStore};

/// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
