//! Compiled-in market table and its load-time validation.
//!
//! All hours are UTC decimal hours using standard (winter) offsets. Daylight
//! saving shifts and exchange holidays are not modeled.

use std::collections::HashMap;

use chrono_tz::Tz;
use log::debug;

use super::regions::Region;
use super::session_clock::timeline;
use super::sessions_model::{MarketDefinition, MarketId, SessionHours};
use crate::errors::ConfigError;

/// Upper bound for a close boundary that rolls into the next day.
const MAX_ROLLOVER_HOUR: f64 = 48.0;

fn market(
    id: MarketId,
    name: &str,
    timezone: Tz,
    regular: SessionHours,
) -> MarketDefinition {
    MarketDefinition {
        id,
        name: name.to_string(),
        timezone,
        regular,
        pre_market: None,
        after_hours: None,
        has_futures: false,
        futures_open: None,
    }
}

/// Built-in definition for `id`.
pub fn builtin_definition(id: MarketId) -> MarketDefinition {
    match id {
        // NYSE/NASDAQ composite: 04:00-09:30 pre, 09:30-16:00 regular,
        // 16:00-20:00 after-hours ET; futures reopen Sunday 18:00 ET.
        MarketId::Us => MarketDefinition {
            pre_market: Some(SessionHours::new(9.0, 14.5)),
            after_hours: Some(SessionHours::new(21.0, 25.0)),
            has_futures: true,
            futures_open: Some(23.0),
            ..market(
                id,
                "US Markets",
                chrono_tz::America::New_York,
                SessionHours::new(14.5, 21.0),
            )
        },
        MarketId::Eu => market(id, "Xetra", chrono_tz::Europe::Berlin, SessionHours::new(8.0, 16.5)),
        MarketId::Uk => market(
            id,
            "London Stock Exchange",
            chrono_tz::Europe::London,
            SessionHours::new(8.0, 16.5),
        ),
        MarketId::Bist => market(
            id,
            "Borsa Istanbul",
            chrono_tz::Europe::Istanbul,
            SessionHours::new(7.0, 15.0),
        ),
        MarketId::Tokyo => market(
            id,
            "Tokyo Stock Exchange",
            chrono_tz::Asia::Tokyo,
            SessionHours::new(0.0, 6.5),
        ),
        MarketId::HongKong => market(
            id,
            "Hong Kong Exchange",
            chrono_tz::Asia::Hong_Kong,
            SessionHours::new(1.5, 8.0),
        ),
        MarketId::Seoul => market(
            id,
            "Korea Exchange",
            chrono_tz::Asia::Seoul,
            SessionHours::new(0.0, 6.5),
        ),
        MarketId::Shanghai => market(
            id,
            "Shanghai Stock Exchange",
            chrono_tz::Asia::Shanghai,
            SessionHours::new(1.5, 7.0),
        ),
        MarketId::India => market(
            id,
            "National Stock Exchange",
            chrono_tz::Asia::Kolkata,
            SessionHours::new(3.75, 10.0),
        ),
    }
}

/// Built-in definitions for every `MarketId`.
pub fn builtin_definitions() -> Vec<MarketDefinition> {
    MarketId::ALL.iter().map(|id| builtin_definition(*id)).collect()
}

fn check_window(
    market: &MarketDefinition,
    window: &'static str,
    hours: SessionHours,
) -> Result<(), ConfigError> {
    if !(0.0..24.0).contains(&hours.open) {
        return Err(ConfigError::OutOfRange {
            market: market.id.to_string(),
            window,
            value: hours.open,
        });
    }
    if hours.close > MAX_ROLLOVER_HOUR || hours.close > hours.open + 24.0 {
        return Err(ConfigError::OutOfRange {
            market: market.id.to_string(),
            window,
            value: hours.close,
        });
    }
    if hours.open >= hours.close {
        return Err(ConfigError::InvertedWindow {
            market: market.id.to_string(),
            window,
            open: hours.open,
            close: hours.close,
        });
    }
    Ok(())
}

impl MarketDefinition {
    /// Rejects inverted, out-of-range or overlapping windows and
    /// inconsistent futures settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window(self, "regular", self.regular)?;
        if let Some(pre) = self.pre_market {
            check_window(self, "pre-market", pre)?;
        }
        if let Some(post) = self.after_hours {
            check_window(self, "after-hours", post)?;
        }

        match (self.has_futures, self.futures_open) {
            (true, None) => {
                return Err(ConfigError::IncompleteWindow {
                    market: self.id.to_string(),
                    window: "futures",
                })
            }
            (false, Some(_)) => {
                return Err(ConfigError::FuturesWithoutSupport {
                    market: self.id.to_string(),
                })
            }
            (true, Some(hour)) if !(0.0..24.0).contains(&hour) => {
                return Err(ConfigError::OutOfRange {
                    market: self.id.to_string(),
                    window: "futures",
                    value: hour,
                })
            }
            _ => {}
        }

        // Sorted consecutive pairs are enough: any overlap with a later
        // window implies an overlap with the window right after it.
        let tl = timeline(self);
        if let Some(pair) = tl.windows(2).find(|pair| pair[0].end > pair[1].start) {
            return Err(ConfigError::OverlappingWindows {
                market: self.id.to_string(),
                first: pair[0].kind.label(),
                second: pair[1].kind.label(),
            });
        }

        Ok(())
    }
}

/// Validated, immutable set of market definitions and region groupings.
#[derive(Debug, Clone)]
pub struct MarketTable {
    markets: HashMap<MarketId, MarketDefinition>,
    regions: HashMap<Region, Vec<MarketId>>,
}

impl MarketTable {
    /// Builds a table, failing on the first invalid definition or region.
    pub fn new(
        definitions: Vec<MarketDefinition>,
        regions: Vec<(Region, Vec<MarketId>)>,
    ) -> Result<Self, ConfigError> {
        let mut markets = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            definition.validate()?;
            let id = definition.id;
            if markets.insert(id, definition).is_some() {
                return Err(ConfigError::DuplicateMarket(id.to_string()));
            }
        }

        let mut region_map = HashMap::with_capacity(regions.len());
        for (region, members) in regions {
            if let Some(missing) = members.iter().find(|m| !markets.contains_key(m)) {
                return Err(ConfigError::UnknownRegionMarket {
                    region: region.to_string(),
                    market: missing.to_string(),
                });
            }
            region_map.insert(region, members);
        }

        debug!(
            "Loaded market table with {} markets and {} regions",
            markets.len(),
            region_map.len()
        );

        Ok(Self {
            markets,
            regions: region_map,
        })
    }

    /// The compiled-in table with default region groupings.
    pub fn builtin() -> Result<Self, ConfigError> {
        let regions = Region::ALL
            .iter()
            .map(|region| (*region, region.default_markets().to_vec()))
            .collect();
        Self::new(builtin_definitions(), regions)
    }

    pub fn get(&self, id: MarketId) -> Option<&MarketDefinition> {
        self.markets.get(&id)
    }

    pub fn contains(&self, id: MarketId) -> bool {
        self.markets.contains_key(&id)
    }

    /// Markets grouped under `region`; empty when the region is not configured.
    pub fn region_markets(&self, region: Region) -> &[MarketId] {
        self.regions.get(&region).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Configured market ids in stable order.
    pub fn market_ids(&self) -> Vec<MarketId> {
        let mut ids: Vec<MarketId> = self.markets.keys().copied().collect();
        ids.sort();
        ids
    }
}
