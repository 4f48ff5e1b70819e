use std::sync::Arc;

use crate::config::Config;
use marketpulse_core::{
    cache::{FreshnessCache, KeyValueStore},
    freshness::FeedRefresher,
    sessions::{MarketId, MarketSessionService, MarketSessionServiceTrait, MarketTable, Region},
    utils::{Clock, SystemClock},
};
use marketpulse_storage_sqlite::{
    db::{self, write_actor},
    SqliteKeyValueStore,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub session_service: Arc<dyn MarketSessionServiceTrait>,
    pub cache: FreshnessCache,
    pub feed_refresher: FeedRefresher,
    pub watch_markets: Vec<MarketId>,
    pub watch_regions: Vec<Region>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("MP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::new(pool, writer));

    let table = Arc::new(MarketTable::builtin()?);
    let session_service = Arc::new(MarketSessionService::new(table, clock.clone()));

    let cache = FreshnessCache::new(store, clock.clone());
    let feed_refresher = FeedRefresher::new(cache.clone(), clock);

    tracing::info!("Storage ready at {}", db_path);

    Ok(Arc::new(AppState {
        session_service,
        cache,
        feed_refresher,
        watch_markets: config.watch_markets.clone(),
        watch_regions: config.watch_regions.clone(),
        db_path,
    }))
}
