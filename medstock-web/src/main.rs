//! MedStock Web Server
//!
//! Serves the inventory ledger API for a clinic or pharmacy.

use anyhow::Context;
use clap::Parser;
use medstock_core::{init_logging, MedstockConfig};
use medstock_web::MedstockServerBuilder;
use std::path::PathBuf;

/// MedStock Web Server - medical supply inventory ledger
#[derive(Parser)]
#[command(name = "medstock-web")]
#[command(about = "Inventory ledger and session API for medical supplies")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Database URL, e.g. sqlite:data/medstock.db
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Mark the session cookie Secure
    #[arg(long)]
    secure_cookies: bool,
}

impl Args {
    fn apply(self, config: &mut MedstockConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if self.secure_cookies {
            config.server.secure_cookies = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let mut config =
        MedstockConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;

    if config.bootstrap.admin_credentials().is_none() {
        tracing::info!("No bootstrap admin configured; existing accounts will be used");
    }

    let server = MedstockServerBuilder::from_config(config)
        .build()
        .await
        .context("Failed to build server")?;

    server.start().await.context("Server failed")?;
    Ok(())
}
