//! Regional aggregation of several markets into one composite status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::market_definitions::MarketTable;
use super::session_clock::MarketTimeline;
use super::sessions_model::{MarketId, SessionState, SessionStatus};
use crate::errors::ValidationError;
use crate::utils::time_utils::whole_minutes_until;

/// Named group of markets shown as one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    Americas,
    Europe,
    AsiaPacific,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Americas, Region::Europe, Region::AsiaPacific];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Americas => "AMERICAS",
            Region::Europe => "EUROPE",
            Region::AsiaPacific => "ASIA_PACIFIC",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Region::Americas => "Americas",
            Region::Europe => "Europe",
            Region::AsiaPacific => "Asia Pacific",
        }
    }

    /// Default constituents used by the built-in table.
    pub fn default_markets(&self) -> &'static [MarketId] {
        match self {
            Region::Americas => &[MarketId::Us],
            Region::Europe => &[MarketId::Eu, MarketId::Uk, MarketId::Bist],
            Region::AsiaPacific => &[
                MarketId::Tokyo,
                MarketId::HongKong,
                MarketId::Seoul,
                MarketId::Shanghai,
                MarketId::India,
            ],
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Region::ALL
            .iter()
            .copied()
            .find(|region| region.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownRegion(s.to_string()))
    }
}

/// Composite label shown for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionalLabel {
    /// At least one constituent is open.
    Open,
    /// Nothing is open but at least one constituent is in pre-market or after-hours.
    PartiallyOpen,
    Closed,
}

impl RegionalLabel {
    pub fn from_statuses(statuses: &[SessionStatus]) -> Self {
        Self::from_states(statuses.iter().map(|s| s.status))
    }

    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = SessionState>,
    {
        let (mut any_open, mut any_extended) = (false, false);
        for state in states {
            any_open |= state.is_open();
            any_extended |= state.is_extended();
        }
        if any_open {
            RegionalLabel::Open
        } else if any_extended {
            RegionalLabel::PartiallyOpen
        } else {
            RegionalLabel::Closed
        }
    }
}

/// Aggregated status of several markets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalStatus {
    pub region: Option<Region>,
    pub label: RegionalLabel,
    pub is_open: bool,
    /// Minutes until the composite label changes, zero when no change is found.
    pub minutes_until_change: u32,
    pub next_change_time: Option<DateTime<Utc>>,
    pub open_markets: Vec<MarketId>,
    pub markets: Vec<SessionStatus>,
}

/// Earliest constituent boundary after `now` at which the composite label
/// differs from `current`. Boundaries that leave the label unchanged (one of
/// several open markets closing) are skipped.
fn next_label_change(
    timelines: &[MarketTimeline<'_>],
    now: DateTime<Utc>,
    current: RegionalLabel,
) -> Option<DateTime<Utc>> {
    let mut boundaries: Vec<DateTime<Utc>> = timelines
        .iter()
        .flat_map(|tl| tl.boundaries_after(now))
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    boundaries.into_iter().find(|boundary| {
        RegionalLabel::from_states(timelines.iter().map(|tl| tl.state_at(*boundary))) != current
    })
}

/// Aggregates `markets` at `now`.
///
/// Markets missing from `table` contribute an unknown status and never
/// influence the label or countdown.
pub fn aggregate_status(
    table: &MarketTable,
    region: Option<Region>,
    markets: &[MarketId],
    now: DateTime<Utc>,
) -> RegionalStatus {
    let mut timelines = Vec::with_capacity(markets.len());
    let statuses: Vec<SessionStatus> = markets
        .iter()
        .map(|id| match table.get(*id) {
            Some(def) => {
                let timeline = MarketTimeline::new(def, now);
                let status = timeline.status_at(now);
                timelines.push(timeline);
                status
            }
            None => SessionStatus::unknown(now),
        })
        .collect();

    let label = RegionalLabel::from_statuses(&statuses);
    let next_change_time = next_label_change(&timelines, now, label);
    let minutes_until_change = next_change_time
        .map(|t| u32::try_from(whole_minutes_until(now, t)).unwrap_or(u32::MAX))
        .unwrap_or(0);

    RegionalStatus {
        region,
        label,
        is_open: statuses.iter().any(|s| s.is_open),
        minutes_until_change,
        next_change_time,
        open_markets: statuses
            .iter()
            .filter(|s| s.is_open)
            .filter_map(|s| s.market)
            .collect(),
        markets: statuses,
    }
}
