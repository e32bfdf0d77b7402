//! 存储接口定义
//!
//! 提供台账持久化能力的抽象接口，支持内存、JSON 文件和 SQLite 实现。
//! 所有变更都通过 [`LedgerStore::transact`] 完成：加载、修改、保存在同一把锁内。

pub mod memory;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::Ledger;
use crate::errors::{LedgerError, Result};

pub use memory::MemoryStore;

/// 台账变更操作
///
/// 持有所有权，实现方可以把它移入阻塞线程池执行
pub type LedgerOp = Box<dyn FnOnce(&mut Ledger) + Send + 'static>;

/// 存储接口
///
/// 实现方必须保证 `transact` 对并发调用是原子的，
/// `snapshot` 不会读到写了一半的台账。
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// 读取一致的台账快照
    ///
    /// 如果存储中还没有台账，返回空台账
    async fn snapshot(&self) -> Result<Ledger>;

    /// 在存储锁内执行一次读-改-写事务
    ///
    /// `op` 恰好被调用一次；台账内容发生变化时才写回
    async fn transact(&self, op: LedgerOp) -> Result<()>;
}

impl dyn LedgerStore {
    /// 执行事务并返回闭包的结果
    pub async fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Ledger) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.transact(Box::new(move |ledger: &mut Ledger| {
            let _ = tx.send(f(ledger));
        }))
        .await?;
        rx.await
            .map_err(|_| LedgerError::StoreUnavailable("transaction was not applied".to_string()))
    }
}

/// 在内存副本上执行操作，返回新台账（若有变化）
pub(crate) fn apply(current: &Ledger, op: LedgerOp) -> Option<Ledger> {
    let mut next = current.clone();
    op(&mut next);
    (next != *current).then_some(next)
}
