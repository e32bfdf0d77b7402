//! 内存存储实现
//!
//! 默认的测试存储实现，数据仅在内存中，重启后丢失

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::Ledger;
use crate::errors::Result;

use super::{apply, LedgerOp, LedgerStore};

/// 内存存储
///
/// 整个台账由一把互斥锁保护，适合测试和无需持久化的场景
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: Mutex<Ledger>,
}

impl MemoryStore {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 以已有台账初始化
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn snapshot(&self) -> Result<Ledger> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.clone())
    }

    async fn transact(&self, op: LedgerOp) -> Result<()> {
        let mut ledger = self.ledger.lock().await;
        if let Some(next) = apply(&ledger, op) {
            *ledger = next;
        }
        Ok(())
    }
}
