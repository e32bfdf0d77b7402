//! 访问码相关模型

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 访问码长度
pub const CODE_LENGTH: usize = 8;

/// 访问码字符集（大写字母 + 数字）
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 默认有效期（小时）
pub const DEFAULT_CODE_TTL_HOURS: i64 = 24;

/// 访问码模型
///
/// 状态只会单向变化：`Active -> Used`（兑换）或 `Active -> Expired`（时间流逝，惰性观察）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCode {
    pub code: String,
    #[serde(with = "iso8601")]
    pub expiration: DateTime<Utc>, // 绝对过期时间
    pub used: bool,
}

impl AccessCode {
    /// 在 `now` 时刻生成一个有效期为 `ttl` 的新访问码
    ///
    /// 过期时间超出可表示范围时返回 `None`
    pub fn generate(now: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        let expiration = now.checked_add_signed(ttl)?;
        Some(Self {
            code: Self::generate_value(),
            expiration,
            used: false,
        })
    }

    /// 生成随机访问码（8位大写字母数字组合）
    fn generate_value() -> String {
        let mut rng = rand::thread_rng();
        (0..CODE_LENGTH)
            .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
            .collect()
    }

    /// 过期时间不晚于 `now` 即视为过期
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }

    /// 未使用且未过期
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_expired_at(now)
    }

    /// 标记为已使用
    pub fn redeem(&mut self) {
        self.used = true;
    }

    /// 日志中使用的脱敏形式，如 `AB****34`
    pub fn masked(&self) -> String {
        mask_code(&self.code)
    }
}

/// 对访问码做脱敏处理，只保留首尾两位
pub fn mask_code(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 4), tail)
}

/// ISO-8601 时间戳的序列化
///
/// 写出 UTC 的 RFC 3339（微秒精度）。读取时接受任意偏移的 RFC 3339；
/// 不带偏移的旧格式按本地时区解释。
pub mod iso8601 {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_utc(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp: {}", raw)))
    }

    /// 格式化为 `2026-10-16T12:00:00.000000Z`
    pub fn format_utc(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// 解析 RFC 3339 或不带偏移的 ISO-8601 时间戳
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
