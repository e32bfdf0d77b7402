mod config;

use access_ledger::domain::access_code::iso8601;
use access_ledger::infrastructure::web::start_web_server;
use access_ledger::logger::{self, LogConfig};
use access_ledger::{open_store, AccessLedger};
use anyhow::Result;
use clap::Parser;
use config::{AppConfig, Command};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cfg = AppConfig::parse();
    logger::init(LogConfig::with_format(cfg.log_format));

    let ledger_config = cfg.ledger_config();
    let store = open_store(&ledger_config).await?;
    let ledger = AccessLedger::from_config(store, &ledger_config);

    match cfg.command {
        Command::Generate => {
            let issued = ledger.generate_code().await?;
            println!("{}\t{}", issued.code, iso8601::format_utc(&issued.expiration));
        }
        Command::Verify { code, user_id } => {
            let verification = ledger.verify_code(&code, &user_id).await?;
            println!("{}\t{}", verification.authorized, verification.reason);
        }
        Command::Check { user_id } => {
            let authorized = ledger.is_user_authorized(&user_id).await?;
            println!("{}", authorized);
        }
        Command::List => {
            for code in ledger.list_active_codes().await? {
                println!("{}\t{}", code.code, iso8601::format_utc(&code.expiration));
            }
        }
        Command::Serve { bind } => {
            info!(backend = %ledger_config.backend, "starting access ledger service");
            start_web_server(&bind, ledger).await?;
        }
    }

    Ok(())
}
