//! 台账聚合根
//!
//! 台账是唯一的持久化单元，每次变更都整体读-改-写。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::access_code::AccessCode;

/// 台账：访问码序列 + 已授权用户
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub codes: Vec<AccessCode>,
    pub authorized_users: Vec<String>, // 保持插入顺序，不含重复
}

/// 兑换结果原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyReason {
    /// 用户此前已被授权
    AlreadyAuthorized,
    /// 访问码兑换成功
    Accepted,
    /// 访问码已过期
    Expired,
    /// 没有匹配的未使用访问码
    Invalid,
}

impl VerifyReason {
    /// 面向用户的提示信息
    pub fn message(&self) -> &'static str {
        match self {
            VerifyReason::AlreadyAuthorized => "Already authorized",
            VerifyReason::Accepted => "Code accepted",
            VerifyReason::Expired => "Code expired",
            VerifyReason::Invalid => "Invalid code",
        }
    }
}

impl fmt::Display for VerifyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// 一次兑换的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub authorized: bool,
    pub reason: VerifyReason,
}

impl Verification {
    fn granted(reason: VerifyReason) -> Self {
        Self {
            authorized: true,
            reason,
        }
    }

    fn denied(reason: VerifyReason) -> Self {
        Self {
            authorized: false,
            reason,
        }
    }
}

impl Ledger {
    /// 创建空台账
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加访问码
    pub fn push_code(&mut self, code: AccessCode) {
        self.codes.push(code);
    }

    /// 移除所有在 `now` 时刻已过期的访问码，返回移除数量
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.codes.len();
        self.codes.retain(|c| !c.is_expired_at(now));
        before - self.codes.len()
    }

    /// 用户是否已被授权
    pub fn is_authorized(&self, user_id: &str) -> bool {
        self.authorized_users.iter().any(|u| u == user_id)
    }

    /// 记录授权用户；已存在时返回 false
    fn authorize(&mut self, user_id: &str) -> bool {
        if self.is_authorized(user_id) {
            return false;
        }
        self.authorized_users.push(user_id.to_string());
        true
    }

    /// 按存储顺序返回 `now` 时刻所有未使用且未过期的访问码
    pub fn active_codes(&self, now: DateTime<Utc>) -> Vec<AccessCode> {
        self.codes
            .iter()
            .filter(|c| c.is_active_at(now))
            .cloned()
            .collect()
    }

    /// 尝试为用户兑换访问码
    ///
    /// 不做清理，调用方应先在同一事务内调用 [`Ledger::prune_expired`]。
    /// 相同码值存在多条未使用记录时，按存储顺序取第一条。
    pub fn redeem(&mut self, code: &str, user_id: &str, now: DateTime<Utc>) -> Verification {
        if self.is_authorized(user_id) {
            return Verification::granted(VerifyReason::AlreadyAuthorized);
        }

        let Some(entry) = self
            .codes
            .iter_mut()
            .find(|c| c.code == code && !c.used)
        else {
            return Verification::denied(VerifyReason::Invalid);
        };

        if entry.is_expired_at(now) {
            return Verification::denied(VerifyReason::Expired);
        }

        entry.redeem();
        self.authorize(user_id);
        Verification::granted(VerifyReason::Accepted)
    }
}
