//! JSON 文件存储实现
//!
//! 台账保存为单个 JSON 文件。写入先落到同目录的临时文件，再原子替换，
//! 失败的保存不会留下新旧混合的内容。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::store::{apply, LedgerOp, LedgerStore};
use crate::domain::Ledger;
use crate::errors::{LedgerError, Result};

/// JSON 文件存储
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    /// 打开台账文件
    ///
    /// 文件或其父目录不存在时会自动创建，初始内容为空台账
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            lock: RwLock::new(()),
        };
        store.ensure_exists().await?;
        Ok(store)
    }

    /// 台账文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_exists(&self) -> Result<()> {
        let _guard = self.lock.write().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }

        self.write(&Ledger::new()).await?;
        info!(path = %self.path.display(), "created empty access ledger");
        Ok(())
    }

    async fn read(&self) -> Result<Ledger> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            LedgerError::StoreUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            LedgerError::MalformedStore(format!("{}: {}", self.path.display(), e))
        })
    }

    async fn write(&self, ledger: &Ledger) -> Result<()> {
        let bytes = to_pretty_json(ledger)?;
        let tmp = self.temp_path();

        let result = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await?;
            sync_parent_dir(&self.path).await
        }
        .await;

        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "failed to save access ledger");
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(LedgerError::StoreUnavailable(format!(
                "{}: {}",
                self.path.display(),
                e
            )));
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
    }
}

/// 刷新父目录，使 rename 本身在崩溃后仍然可见
#[cfg(unix)]
async fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    tokio::fs::File::open(parent).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// 4 空格缩进的 JSON
fn to_pretty_json(ledger: &Ledger) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    ledger.serialize(&mut serializer)?;
    Ok(buf)
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn snapshot(&self) -> Result<Ledger> {
        let _guard = self.lock.read().await;
        self.read().await
    }

    async fn transact(&self, op: LedgerOp) -> Result<()> {
        let _guard = self.lock.write().await;
        let current = self.read().await?;
        if let Some(next) = apply(&current, op) {
            self.write(&next).await?;
            debug!(path = %self.path.display(), "access ledger saved");
        }
        Ok(())
    }
}
