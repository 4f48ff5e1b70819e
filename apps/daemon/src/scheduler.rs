//! Background tasks: the session status ticker and the expired-entry sweep.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::main_lib::AppState;
use marketpulse_core::freshness::FeedId;

/// Starts the status ticker. Each tick recomputes every watched market and
/// region, which is what keeps dashboard countdowns live.
pub fn start_status_ticker(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Status ticker started ({}s interval)", every.as_secs());
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_status_tick(&state).await;
        }
    })
}

/// Starts the periodic sweep of expired cache entries.
pub fn start_cache_sweeper(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Cache sweeper started ({}m interval)", every.as_secs() / 60);
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = state.cache.clear_expired().await;
            if removed > 0 {
                info!("Swept {} expired cache entries", removed);
            } else {
                debug!("Cache sweep found nothing to remove");
            }
        }
    })
}

/// Logs one snapshot of watched markets, regions and feeds due for refresh.
pub async fn run_status_tick(state: &AppState) {
    for market in &state.watch_markets {
        let status = state.session_service.get_market_status(market.as_str());
        let local = state
            .session_service
            .market_definition(*market)
            .map(|def| status.next_event_local(def.timezone).to_rfc3339())
            .unwrap_or_else(|| status.next_event_time.to_rfc3339());
        info!(
            market = market.as_str(),
            status = status.status.as_str(),
            next_event = ?status.next_event,
            minutes = status.minutes_until_change,
            "{} {} ({:?} in {} min, at {})",
            market,
            status.status.as_str(),
            status.next_event,
            status.minutes_until_change,
            local
        );
    }

    for region in &state.watch_regions {
        let regional = state.session_service.get_region_status(*region);
        info!(
            region = region.as_str(),
            label = ?regional.label,
            open_markets = regional.open_markets.len(),
            minutes = regional.minutes_until_change,
            "{} is {:?}",
            region.display_name(),
            regional.label
        );
    }

    let due = state.feed_refresher.due_feeds(&FeedId::ALL).await;
    if !due.is_empty() {
        let names: Vec<&str> = due.iter().map(|feed| feed.as_str()).collect();
        debug!("Feeds due for refresh: {}", names.join(", "));
    }
}
