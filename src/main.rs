//! Vault Withdrawal Monitor
//!
//! Periodic risk monitor for a pooled-fund vault.
//! Features:
//! - Polls vault, depositor and risk-engine state on a fixed interval
//! - Warns when pending withdrawals exceed the vault's withdrawal capacity
//! - Warns when a depositor's request would make the vault liquidatable
//! - Detection only: never sends a transaction

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vault_monitor_chain::HttpStateProvider;
use vault_monitor_core::{LogFormat, Monitor, MonitorConfig, MonitorSettings, TracingSink};

const DEFAULT_LOG_FILTER: &str = "info,vault_monitor_core=debug,vault_monitor_chain=debug";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Print startup banner
    print_banner();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Configuration errors are fatal before any cycle runs
    let config = MonitorConfig::load()?;

    init_tracing(config.log_format);
    config.log_config();

    let vault = config.vault()?;
    info!("Starting Withdrawals Monitor");
    info!(vault = %vault, "Vault");

    let provider = Arc::new(HttpStateProvider::new(
        config.state_api_url.clone(),
        config.request_timeout(),
    )?);

    let monitor = Monitor::new(provider, TracingSink, vault, MonitorSettings::from(&config));
    monitor.run().await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }
}

/// Print startup banner.
fn print_banner() {
    println!(
        r#"
    Vault Withdrawal Monitor v{}
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
