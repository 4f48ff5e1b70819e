use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;

use super::market_definitions::MarketTable;
use super::regions::{aggregate_status, Region, RegionalStatus};
use super::session_clock::compute_status;
use super::sessions_model::{MarketDefinition, MarketId, SessionStatus};
use crate::utils::time_utils::Clock;

/// Trait defining the contract for market session queries.
///
/// All methods are synchronous and infallible. Unknown ids resolve to a safe
/// closed status instead of an error.
pub trait MarketSessionServiceTrait: Send + Sync {
    fn get_market_status(&self, market_id: &str) -> SessionStatus;

    fn get_market_status_at(&self, market_id: &str, now: DateTime<Utc>) -> SessionStatus;

    fn is_market_open(&self, market_id: &str) -> bool;

    fn is_market_open_at(&self, market_id: &str, now: DateTime<Utc>) -> bool;

    fn get_regional_status(&self, market_ids: &[&str]) -> RegionalStatus;

    fn get_regional_status_at(&self, market_ids: &[&str], now: DateTime<Utc>) -> RegionalStatus;

    fn get_region_status(&self, region: Region) -> RegionalStatus;

    fn get_region_status_at(&self, region: Region, now: DateTime<Utc>) -> RegionalStatus;

    fn market_definition(&self, market_id: MarketId) -> Option<MarketDefinition>;
}

pub struct MarketSessionService {
    table: Arc<MarketTable>,
    clock: Arc<dyn Clock>,
}

impl MarketSessionService {
    pub fn new(table: Arc<MarketTable>, clock: Arc<dyn Clock>) -> Self {
        MarketSessionService { table, clock }
    }

    /// Typed lookup used once an id has been parsed.
    pub fn status_for(&self, market_id: MarketId, now: DateTime<Utc>) -> SessionStatus {
        match self.table.get(market_id) {
            Some(def) => compute_status(def, now),
            None => {
                debug!("Market {} is not configured; returning closed", market_id);
                SessionStatus::unknown(now)
            }
        }
    }
}

impl MarketSessionServiceTrait for MarketSessionService {
    fn get_market_status(&self, market_id: &str) -> SessionStatus {
        self.get_market_status_at(market_id, self.clock.now())
    }

    fn get_market_status_at(&self, market_id: &str, now: DateTime<Utc>) -> SessionStatus {
        match market_id.parse::<MarketId>() {
            Ok(id) => self.status_for(id, now),
            Err(e) => {
                debug!("{}; returning closed", e);
                SessionStatus::unknown(now)
            }
        }
    }

    fn is_market_open(&self, market_id: &str) -> bool {
        self.get_market_status(market_id).is_open
    }

    fn is_market_open_at(&self, market_id: &str, now: DateTime<Utc>) -> bool {
        self.get_market_status_at(market_id, now).is_open
    }

    fn get_regional_status(&self, market_ids: &[&str]) -> RegionalStatus {
        self.get_regional_status_at(market_ids, self.clock.now())
    }

    fn get_regional_status_at(&self, market_ids: &[&str], now: DateTime<Utc>) -> RegionalStatus {
        let mut known = Vec::with_capacity(market_ids.len());
        let mut unknown_count = 0;
        for raw in market_ids {
            match raw.parse::<MarketId>() {
                Ok(id) => known.push(id),
                Err(e) => {
                    debug!("{}; treating as closed in regional status", e);
                    unknown_count += 1;
                }
            }
        }

        let mut status = aggregate_status(&self.table, None, &known, now);
        status
            .markets
            .extend(std::iter::repeat_with(|| SessionStatus::unknown(now)).take(unknown_count));
        status
    }

    fn get_region_status(&self, region: Region) -> RegionalStatus {
        self.get_region_status_at(region, self.clock.now())
    }

    fn get_region_status_at(&self, region: Region, now: DateTime<Utc>) -> RegionalStatus {
        aggregate_status(
            &self.table,
            Some(region),
            self.table.region_markets(region),
            now,
        )
    }

    fn market_definition(&self, market_id: MarketId) -> Option<MarketDefinition> {
        self.table.get(market_id).cloned()
    }
}
