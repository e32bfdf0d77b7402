//! 访问码台账服务
//!
//! 签发、兑换访问码并回答授权查询。所有变更都在存储事务内完成，
//! 同一个访问码在并发兑换下只会成功一次。

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::LedgerConfig;
use crate::core::store::LedgerStore;
use crate::domain::{mask_code, AccessCode, Verification, VerifyReason, DEFAULT_CODE_TTL_HOURS};
use crate::errors::{LedgerError, Result};

/// 新签发的访问码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: String,
    pub expiration: DateTime<Utc>,
}

/// 访问码台账
#[derive(Clone)]
pub struct AccessLedger {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    code_ttl: Duration,
}

impl AccessLedger {
    /// 使用系统时钟和默认有效期（24 小时）创建
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            code_ttl: Duration::hours(DEFAULT_CODE_TTL_HOURS),
        }
    }

    /// 按配置创建
    pub fn from_config(store: Arc<dyn LedgerStore>, config: &LedgerConfig) -> Self {
        Self::new(store).with_code_ttl(config.code_ttl())
    }

    /// 注入时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 设置有效期
    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
    }

    /// 生成新的访问码并持久化
    pub async fn generate_code(&self) -> Result<IssuedCode> {
        let now = self.clock.now();
        let code = AccessCode::generate(now, self.code_ttl).ok_or_else(|| {
            LedgerError::ConfigError(format!(
                "code ttl of {} hours overflows the expiration timestamp",
                self.code_ttl.num_hours()
            ))
        })?;
        let issued = IssuedCode {
            code: code.code.clone(),
            expiration: code.expiration,
        };
        let masked = code.masked();

        self.store.update(move |ledger| ledger.push_code(code)).await?;

        info!(code = %masked, expiration = %issued.expiration, "access code generated");
        Ok(issued)
    }

    /// 为用户兑换访问码
    ///
    /// 过期清理、授权判断和兑换在同一事务内完成。
    /// 兑换失败不是错误，通过 [`Verification::reason`] 返回。
    pub async fn verify_code(&self, code: &str, user_id: &str) -> Result<Verification> {
        let now = self.clock.now();
        let (owned_code, owned_user) = (code.to_string(), user_id.to_string());

        let (verification, pruned) = self
            .store
            .update(move |ledger| {
                let pruned = ledger.prune_expired(now);
                (ledger.redeem(&owned_code, &owned_user, now), pruned)
            })
            .await?;

        if pruned > 0 {
            debug!(pruned, "expired access codes pruned");
        }

        match verification.reason {
            VerifyReason::Accepted => {
                info!(code = %mask_code(code), user_id, "access code redeemed");
            }
            reason => {
                debug!(code = %mask_code(code), user_id, %reason, "access code not redeemed");
            }
        }

        Ok(verification)
    }

    /// 用户是否已被授权（只读）
    pub async fn is_user_authorized(&self, user_id: &str) -> Result<bool> {
        let ledger = self.store.snapshot().await?;
        Ok(ledger.is_authorized(user_id))
    }

    /// 列出当前所有未使用且未过期的访问码（只读，不清理）
    pub async fn list_active_codes(&self) -> Result<Vec<AccessCode>> {
        let now = self.clock.now();
        let ledger = self.store.snapshot().await?;
        Ok(ledger.active_codes(now))
    }
}
