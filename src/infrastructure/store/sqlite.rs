//! SQLite 存储实现
//!
//! 使用 SQLite 作为后端，适合多进程共享台账的场景。
//! 每次事务都是一次 `BEGIN IMMEDIATE`，整体重写台账。

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{Connection, TransactionBehavior};
use tracing::debug;

use crate::core::store::{apply, LedgerOp, LedgerStore};
use crate::domain::access_code::iso8601;
use crate::domain::{AccessCode, Ledger};
use crate::errors::{LedgerError, Result};

/// SQLite 存储
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// 创建新的 SQLite 存储
    ///
    /// 如果数据库文件或其父目录不存在，会自动创建
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        debug!(path = %db_path.display(), "sqlite ledger opened");
        Ok(store)
    }

    /// 创建内存数据库（用于测试）
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
        conn.lock().map_err(|e| {
            LedgerError::StoreUnavailable(format!("Failed to acquire database lock: {}", e))
        })
    }

    /// 初始化数据库表结构
    fn init_schema(&self) -> Result<()> {
        let conn = Self::lock(&self.conn)?;

        conn.execute_batch(
            "
            -- 访问码表，seq 保存存储顺序
            CREATE TABLE IF NOT EXISTS access_codes (
                seq INTEGER PRIMARY KEY,
                code TEXT NOT NULL,
                expiration TEXT NOT NULL,
                used INTEGER NOT NULL DEFAULT 0
            );

            -- 已授权用户表
            CREATE TABLE IF NOT EXISTS authorized_users (
                seq INTEGER PRIMARY KEY,
                user_id TEXT UNIQUE NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_access_codes_code ON access_codes(code);
            ",
        )?;

        Ok(())
    }

    /// 在阻塞线程池中执行数据库操作
    async fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Self::lock(&conn)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| LedgerError::StoreUnavailable(format!("Task failed: {}", e)))?
    }
}

/// 读取完整台账
fn load_ledger(conn: &Connection) -> Result<Ledger> {
    let mut ledger = Ledger::new();

    let mut stmt = conn.prepare("SELECT code, expiration, used FROM access_codes ORDER BY seq")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, bool>(2)?,
        ))
    })?;

    for row in rows {
        let (code, expiration, used) = row?;
        let expiration = iso8601::parse(&expiration).ok_or_else(|| {
            LedgerError::MalformedStore(format!("invalid expiration timestamp: {}", expiration))
        })?;
        ledger.codes.push(AccessCode {
            code,
            expiration,
            used,
        });
    }

    let mut stmt = conn.prepare("SELECT user_id FROM authorized_users ORDER BY seq")?;
    let users = stmt.query_map([], |row| row.get::<_, String>(0))?;
    for user in users {
        ledger.authorized_users.push(user?);
    }

    Ok(ledger)
}

/// 整体重写台账
fn save_ledger(conn: &Connection, ledger: &Ledger) -> Result<()> {
    conn.execute("DELETE FROM access_codes", [])?;
    conn.execute("DELETE FROM authorized_users", [])?;

    let mut stmt = conn.prepare(
        "INSERT INTO access_codes (seq, code, expiration, used) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (seq, code) in ledger.codes.iter().enumerate() {
        stmt.execute(rusqlite::params![
            seq as i64,
            &code.code,
            iso8601::format_utc(&code.expiration),
            code.used,
        ])?;
    }

    let mut stmt = conn.prepare("INSERT INTO authorized_users (seq, user_id) VALUES (?1, ?2)")?;
    for (seq, user_id) in ledger.authorized_users.iter().enumerate() {
        stmt.execute(rusqlite::params![seq as i64, user_id])?;
    }

    Ok(())
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn snapshot(&self) -> Result<Ledger> {
        self.execute(|conn| {
            let tx = conn.transaction()?;
            let ledger = load_ledger(&tx)?;
            tx.commit()?;
            Ok(ledger)
        })
        .await
    }

    async fn transact(&self, op: LedgerOp) -> Result<()> {
        // 等待其他进程释放写锁可能长达 busy_timeout，必须在阻塞线程池中进行
        self.execute(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current = load_ledger(&tx)?;
            if let Some(next) = apply(&current, op) {
                save_ledger(&tx, &next)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}
