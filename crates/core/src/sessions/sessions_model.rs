//! Domain models for trading sessions.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::utils::time_utils::to_local;

/// Identifier of a tracked market.
///
/// String ids coming from widgets are parsed once into this enum, so an
/// unconfigured id is caught at the boundary instead of deep inside a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketId {
    Us,
    Eu,
    Uk,
    Bist,
    Tokyo,
    HongKong,
    Seoul,
    Shanghai,
    India,
}

impl MarketId {
    pub const ALL: [MarketId; 9] = [
        MarketId::Us,
        MarketId::Eu,
        MarketId::Uk,
        MarketId::Bist,
        MarketId::Tokyo,
        MarketId::HongKong,
        MarketId::Seoul,
        MarketId::Shanghai,
        MarketId::India,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketId::Us => "US",
            MarketId::Eu => "EU",
            MarketId::Uk => "UK",
            MarketId::Bist => "BIST",
            MarketId::Tokyo => "TOKYO",
            MarketId::HongKong => "HONGKONG",
            MarketId::Seoul => "SEOUL",
            MarketId::Shanghai => "SHANGHAI",
            MarketId::India => "INDIA",
        }
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        MarketId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownMarket(s.to_string()))
    }
}

/// Trading mode a market is in at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Open,
    Closed,
    Pre,
    Post,
    Futures,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Open => "open",
            SessionState::Closed => "closed",
            SessionState::Pre => "pre",
            SessionState::Post => "post",
            SessionState::Futures => "futures",
        }
    }

    /// Whether the state counts as "open for trading".
    ///
    /// Extended-hours windows are not counted; the synthetic futures session is.
    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Open | SessionState::Futures)
    }

    /// Pre-market and after-hours.
    pub fn is_extended(&self) -> bool {
        matches!(self, SessionState::Pre | SessionState::Post)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The boundary a countdown is running towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NextEvent {
    #[serde(rename = "pre")]
    PreMarketOpen,
    #[serde(rename = "preClose")]
    PreMarketClose,
    #[serde(rename = "open")]
    RegularOpen,
    #[serde(rename = "close")]
    RegularClose,
    #[serde(rename = "post")]
    AfterHoursOpen,
    #[serde(rename = "postClose")]
    AfterHoursClose,
    #[serde(rename = "futures")]
    FuturesOpen,
    #[serde(rename = "futuresClose")]
    FuturesClose,
    /// No boundary is known (unknown market).
    #[serde(rename = "none")]
    None,
}

/// A session window in UTC decimal hours. `close` may exceed 24 to denote a
/// window that ends after midnight UTC on the following day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHours {
    pub open: f64,
    pub close: f64,
}

impl SessionHours {
    pub const fn new(open: f64, close: f64) -> Self {
        Self { open, close }
    }
}

/// Static definition of one market's daily sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDefinition {
    pub id: MarketId,
    pub name: String,
    /// Display zone. Used only to localise resolved instants, never in session math.
    #[serde(skip, default = "default_display_tz")]
    pub timezone: Tz,
    pub regular: SessionHours,
    pub pre_market: Option<SessionHours>,
    pub after_hours: Option<SessionHours>,
    pub has_futures: bool,
    /// UTC hour on Sunday at which round-the-clock futures trading begins.
    pub futures_open: Option<f64>,
}

fn default_display_tz() -> Tz {
    chrono_tz::UTC
}

/// Derived session status of one market at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Resolved market, `None` when the requested id is not configured.
    pub market: Option<MarketId>,
    pub status: SessionState,
    pub is_open: bool,
    pub minutes_until_change: u32,
    pub next_event_time: DateTime<Utc>,
    pub next_event: NextEvent,
    pub unknown: bool,
}

impl SessionStatus {
    /// Safe default for an unconfigured market id.
    pub fn unknown(now: DateTime<Utc>) -> Self {
        Self {
            market: None,
            status: SessionState::Closed,
            is_open: false,
            minutes_until_change: 0,
            next_event_time: now,
            next_event: NextEvent::None,
            unknown: true,
        }
    }

    /// Next boundary expressed in `tz` for the presentation layer.
    pub fn next_event_local(&self, tz: Tz) -> DateTime<Tz> {
        to_local(self.next_event_time, tz)
    }
}
