use std::path::PathBuf;

use access_ledger::core::config::{LedgerConfig, StoreBackend, DEFAULT_LEDGER_PATH};
use access_ledger::domain::DEFAULT_CODE_TTL_HOURS;
use access_ledger::logger::LogFormat;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Issue, redeem and track time-limited access codes"
)]
pub struct AppConfig {
    /// 台账存储位置
    #[arg(long, env = "ACCESS_LEDGER_PATH", default_value = DEFAULT_LEDGER_PATH)]
    pub ledger_path: PathBuf,

    /// 存储后端: json, sqlite, memory
    #[arg(long, env = "ACCESS_LEDGER_BACKEND", default_value = "json")]
    pub backend: StoreBackend,

    /// 访问码有效期（小时）
    #[arg(long, env = "ACCESS_CODE_TTL_HOURS", default_value_t = DEFAULT_CODE_TTL_HOURS)]
    pub code_ttl_hours: i64,

    /// 日志格式: pretty, compact, json
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// 生成新的访问码
    Generate,
    /// 为用户兑换访问码
    Verify {
        code: String,
        user_id: String,
    },
    /// 查询用户是否已授权
    Check {
        user_id: String,
    },
    /// 列出所有有效访问码
    List,
    /// 启动 HTTP 服务
    Serve {
        #[arg(long, env = "ACCESS_LEDGER_BIND", default_value = "127.0.0.1:8080")]
        bind: String,
    },
}

impl AppConfig {
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig::new(self.ledger_path.clone(), self.backend)
            .with_code_ttl_hours(self.code_ttl_hours)
    }
}
