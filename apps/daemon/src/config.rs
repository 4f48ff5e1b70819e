use std::time::Duration;

use anyhow::Context;
use marketpulse_core::sessions::{MarketId, Region};

pub struct Config {
    pub db_path: String,
    pub tick_interval: Duration,
    pub sweep_interval: Duration,
    pub watch_markets: Vec<MarketId>,
    pub watch_regions: Vec<Region>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Ids are validated here so
    /// a typo fails at startup instead of silently reporting "closed".
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("MP_DB_PATH").unwrap_or_else(|| "./db/marketpulse.db".into());
        let tick_secs: u64 = lookup("MP_TICK_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(60);
        let sweep_minutes: u64 = lookup("MP_SWEEP_MINUTES")
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(15);

        let watch_markets = match lookup("MP_WATCH_MARKETS") {
            Some(raw) => split_list(&raw)
                .map(|id| {
                    id.parse::<MarketId>()
                        .with_context(|| format!("Invalid MP_WATCH_MARKETS entry '{}'", id))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => MarketId::ALL.to_vec(),
        };
        let watch_regions = match lookup("MP_WATCH_REGIONS") {
            Some(raw) => split_list(&raw)
                .map(|name| {
                    name.parse::<Region>()
                        .with_context(|| format!("Invalid MP_WATCH_REGIONS entry '{}'", name))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => Region::ALL.to_vec(),
        };

        Ok(Self {
            db_path,
            tick_interval: Duration::from_secs(tick_secs),
            sweep_interval: Duration::from_secs(sweep_minutes * 60),
            watch_markets,
            watch_regions,
        })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}
