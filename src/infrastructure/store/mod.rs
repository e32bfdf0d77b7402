//! 存储实现
//!
//! 根据配置选择台账存储后端

pub mod json_file;
pub mod sqlite;

use std::sync::Arc;

use tracing::info;

use crate::core::config::{LedgerConfig, StoreBackend};
use crate::core::store::{LedgerStore, MemoryStore};
use crate::errors::Result;

pub use json_file::JsonFileStore;
pub use sqlite::SqliteStore;

/// 按配置打开台账存储，不存在时自动创建
pub async fn open_store(config: &LedgerConfig) -> Result<Arc<dyn LedgerStore>> {
    config.validate()?;

    let store: Arc<dyn LedgerStore> = match config.backend {
        StoreBackend::Json => Arc::new(JsonFileStore::open(&config.ledger_path).await?),
        StoreBackend::Sqlite => Arc::new(SqliteStore::new(&config.ledger_path)?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };

    info!(
        backend = %config.backend,
        path = %config.ledger_path.display(),
        "access ledger store ready"
    );
    Ok(store)
}
