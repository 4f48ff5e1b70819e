use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Prefix of the cache key holding a feed's last good value.
pub const FEED_KEY_PREFIX: &str = "feed:";

/// Decision policy for when a feed may be re-fetched automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// At least `minutes` between fetches.
    EveryNMinutes { minutes: u32 },
    /// At least `hours` between automatic fetches.
    OnceRollingHours { hours: u32 },
    /// At most one fetch per ISO-8601 week (Monday start).
    OncePerIsoWeek,
}

impl fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshPolicy::EveryNMinutes { minutes } => write!(f, "EveryNMinutes({}m)", minutes),
            RefreshPolicy::OnceRollingHours { hours } => write!(f, "OnceRollingHours({}h)", hours),
            RefreshPolicy::OncePerIsoWeek => write!(f, "OncePerIsoWeek"),
        }
    }
}

/// What caused a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    /// Timer or background refresh; respects the freshness gate.
    #[default]
    Automatic,
    /// User action; always bypasses the gate.
    Manual,
}

/// Data feeds shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedId {
    FearGreedIndex,
    EconomicCalendar,
    CurrencyRates,
    CryptoPrices,
    MarketIndices,
}

impl FeedId {
    pub const ALL: [FeedId; 5] = [
        FeedId::FearGreedIndex,
        FeedId::EconomicCalendar,
        FeedId::CurrencyRates,
        FeedId::CryptoPrices,
        FeedId::MarketIndices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedId::FearGreedIndex => "fear_greed_index",
            FeedId::EconomicCalendar => "economic_calendar",
            FeedId::CurrencyRates => "currency_rates",
            FeedId::CryptoPrices => "crypto_prices",
            FeedId::MarketIndices => "market_indices",
        }
    }

    /// Policy applied when the caller does not supply one.
    pub fn default_policy(&self) -> RefreshPolicy {
        match self {
            FeedId::FearGreedIndex => RefreshPolicy::OnceRollingHours { hours: 24 },
            FeedId::EconomicCalendar => RefreshPolicy::OncePerIsoWeek,
            FeedId::CurrencyRates => RefreshPolicy::EveryNMinutes { minutes: 60 },
            FeedId::CryptoPrices => RefreshPolicy::EveryNMinutes { minutes: 5 },
            FeedId::MarketIndices => RefreshPolicy::EveryNMinutes { minutes: 5 },
        }
    }

    /// Cache key of the feed's last good value.
    pub fn cache_key(&self) -> String {
        format!("{}{}", FEED_KEY_PREFIX, self.as_str())
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        FeedId::ALL
            .iter()
            .copied()
            .find(|feed| feed.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownFeed(s.to_string()))
    }
}

/// Result of a gated refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome<T> {
    /// The gate said the stored value is still fresh; no fetch was made.
    Fresh(T),
    /// A fetch succeeded and its value was stored.
    Fetched(T),
    /// The fetch failed; the last good value is served unchanged.
    StaleServed { value: T, error: String },
}

impl<T> RefreshOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            RefreshOutcome::Fresh(value)
            | RefreshOutcome::Fetched(value)
            | RefreshOutcome::StaleServed { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            RefreshOutcome::Fresh(value)
            | RefreshOutcome::Fetched(value)
            | RefreshOutcome::StaleServed { value, .. } => value,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, RefreshOutcome::StaleServed { .. })
    }

    pub fn did_fetch(&self) -> bool {
        !matches!(self, RefreshOutcome::Fresh(_))
    }
}
