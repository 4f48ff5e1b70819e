mod config;
mod main_lib;
mod scheduler;

use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config).await?;

    let ticker = scheduler::start_status_ticker(state.clone(), config.tick_interval);
    let sweeper = scheduler::start_cache_sweeper(state.clone(), config.sweep_interval);

    tracing::info!(
        "MarketPulse daemon running: {} markets, {} regions, db {}",
        state.watch_markets.len(),
        state.watch_regions.len(),
        state.db_path
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    ticker.abort();
    sweeper.abort();
    Ok(())
}
