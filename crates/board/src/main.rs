//! Headless board runner: loads configuration, connects the sheet store, and
//! keeps the local collection and the budget ledger in sync until shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;

use ciboard_board::{spawn_poller, spawn_rollover, telemetry, RequestBoard};
use ciboard_core::config::{AppConfig, LoadOptions};
use ciboard_store::SheetStore;

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    telemetry::init_logging(&config);

    let store = Arc::new(SheetStore::from_config(&config.store)?);
    let board = Arc::new(Mutex::new(RequestBoard::new(store, config.budget.monthly_hours)));

    {
        let mut board = board.lock().await;
        board.refresh().await?;
        let summary = board.budget_summary();
        tracing::info!(
            month = %summary.month,
            approved_hours = %summary.approved,
            remaining_hours = %summary.remaining,
            "initial load complete"
        );
    }

    let poller =
        spawn_poller(board.clone(), Duration::from_secs(config.sync.poll_interval_secs));
    let rollover =
        spawn_rollover(board.clone(), Duration::from_secs(config.sync.rollover_check_secs));

    tracing::info!("ciboard started");
    tokio::signal::ctrl_c().await?;
    tracing::info!("ciboard stopping");

    poller.abort();
    rollover.abort();
    Ok(())
}
