//! Session state derivation.
//!
//! A market's definition is unrolled into a weekly timeline of UTC intervals
//! (seconds from Sunday 00:00 UTC). The current week is padded with the
//! previous and next week so that windows rolling past midnight, the
//! Friday-to-Monday gap and the Sunday futures open all resolve by a plain
//! scan. Weekend days never receive intervals except the futures window.

use chrono::{DateTime, Duration, Utc};

use super::sessions_model::{MarketDefinition, NextEvent, SessionHours, SessionState, SessionStatus};
use crate::utils::time_utils::{
    decimal_hours_to_minutes, start_of_utc_week, whole_minutes_until, MINUTES_PER_DAY,
    MINUTES_PER_WEEK,
};

/// Monday..Friday counted from Sunday.
const TRADING_DAYS: std::ops::RangeInclusive<i64> = 1..=5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowKind {
    Pre,
    Regular,
    Post,
    Futures,
}

impl WindowKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            WindowKind::Pre => "pre-market",
            WindowKind::Regular => "regular",
            WindowKind::Post => "after-hours",
            WindowKind::Futures => "futures",
        }
    }

    fn state(&self) -> SessionState {
        match self {
            WindowKind::Pre => SessionState::Pre,
            WindowKind::Regular => SessionState::Open,
            WindowKind::Post => SessionState::Post,
            WindowKind::Futures => SessionState::Futures,
        }
    }

    fn open_event(&self) -> NextEvent {
        match self {
            WindowKind::Pre => NextEvent::PreMarketOpen,
            WindowKind::Regular => NextEvent::RegularOpen,
            WindowKind::Post => NextEvent::AfterHoursOpen,
            WindowKind::Futures => NextEvent::FuturesOpen,
        }
    }

    fn close_event(&self) -> NextEvent {
        match self {
            WindowKind::Pre => NextEvent::PreMarketClose,
            WindowKind::Regular => NextEvent::RegularClose,
            WindowKind::Post => NextEvent::AfterHoursClose,
            WindowKind::Futures => NextEvent::FuturesClose,
        }
    }
}

/// Half-open `[start, end)` interval in seconds from the week start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Interval {
    pub(crate) kind: WindowKind,
    pub(crate) start: i64,
    pub(crate) end: i64,
}

impl Interval {
    fn from_minutes(kind: WindowKind, start: i64, end: i64) -> Self {
        Self {
            kind,
            start: start * 60,
            end: end * 60,
        }
    }

    fn contains(&self, t: i64) -> bool {
        self.start <= t && t < self.end
    }
}

fn day_window(kind: WindowKind, hours: SessionHours, day_base: i64) -> Interval {
    Interval::from_minutes(
        kind,
        day_base + decimal_hours_to_minutes(hours.open),
        day_base + decimal_hours_to_minutes(hours.close),
    )
}

/// Intervals of one week, shifted by `week_offset` weeks.
///
/// Every window is cut at Saturday 00:00 UTC, so Friday sessions rolling
/// past midnight never spill into the weekend.
fn week_intervals(def: &MarketDefinition, week_offset: i64) -> Vec<Interval> {
    let week_base = week_offset * MINUTES_PER_WEEK;
    let saturday = (week_base + 6 * MINUTES_PER_DAY) * 60;
    let mut intervals = Vec::with_capacity(16);

    if def.has_futures {
        if let Some(futures_open) = def.futures_open {
            intervals.push(Interval::from_minutes(
                WindowKind::Futures,
                week_base + decimal_hours_to_minutes(futures_open),
                week_base + MINUTES_PER_DAY,
            ));
        }
    }

    for day in TRADING_DAYS {
        let day_base = week_base + day * MINUTES_PER_DAY;
        if let Some(pre) = def.pre_market {
            intervals.push(day_window(WindowKind::Pre, pre, day_base));
        }
        intervals.push(day_window(WindowKind::Regular, def.regular, day_base));
        if let Some(post) = def.after_hours {
            intervals.push(day_window(WindowKind::Post, post, day_base));
        }
    }

    intervals
        .into_iter()
        .map(|iv| Interval {
            end: iv.end.min(saturday),
            ..iv
        })
        .filter(|iv| iv.start < iv.end)
        .collect()
}

/// Sorted timeline covering the previous, current and next week.
pub(crate) fn timeline(def: &MarketDefinition) -> Vec<Interval> {
    let mut intervals: Vec<Interval> = (-1..=1)
        .flat_map(|offset| week_intervals(def, offset))
        .collect();
    intervals.sort_by_key(|iv| (iv.start, iv.end));
    intervals
}

/// A market's timeline anchored at the UTC week containing an instant.
///
/// Built once per query and reused for every instant inside the padded
/// three-week range.
pub(crate) struct MarketTimeline<'a> {
    def: &'a MarketDefinition,
    week_start: DateTime<Utc>,
    intervals: Vec<Interval>,
}

impl<'a> MarketTimeline<'a> {
    pub(crate) fn new(def: &'a MarketDefinition, anchor: DateTime<Utc>) -> Self {
        Self {
            def,
            week_start: start_of_utc_week(anchor),
            intervals: timeline(def),
        }
    }

    fn offset(&self, instant: DateTime<Utc>) -> i64 {
        (instant - self.week_start).num_seconds()
    }

    fn at(&self, offset: i64) -> DateTime<Utc> {
        self.week_start + Duration::seconds(offset)
    }

    /// Session state at `instant`, without the next-event lookup.
    pub(crate) fn state_at(&self, instant: DateTime<Utc>) -> SessionState {
        let t = self.offset(instant);
        self.intervals
            .iter()
            .find(|iv| iv.contains(t))
            .map_or(SessionState::Closed, |iv| iv.kind.state())
    }

    /// Every window start or end strictly after `instant`, ascending.
    pub(crate) fn boundaries_after(
        &self,
        instant: DateTime<Utc>,
    ) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        let t = self.offset(instant);
        self.intervals
            .iter()
            .flat_map(|iv| [iv.start, iv.end])
            .filter(move |edge| *edge > t)
            .map(move |edge| self.at(edge))
    }

    pub(crate) fn status_at(&self, now: DateTime<Utc>) -> SessionStatus {
        let t = self.offset(now);
        let intervals = &self.intervals;

        let resolved = match intervals.iter().position(|iv| iv.contains(t)) {
            // Futures trading announces the close of the first regular
            // session that follows it.
            Some(idx) if intervals[idx].kind == WindowKind::Futures => {
                let current = intervals[idx];
                let regular = intervals[idx + 1..]
                    .iter()
                    .find(|iv| iv.kind == WindowKind::Regular);
                Some(match regular {
                    Some(regular) => (current.kind.state(), NextEvent::RegularClose, regular.end),
                    None => (current.kind.state(), current.kind.close_event(), current.end),
                })
            }
            Some(idx) => {
                let current = intervals[idx];
                let follower = intervals
                    .get(idx + 1)
                    .filter(|next| next.start == current.end);
                let event = match follower {
                    Some(next) if current.kind == WindowKind::Pre => next.kind.open_event(),
                    _ => current.kind.close_event(),
                };
                Some((current.kind.state(), event, current.end))
            }
            None => intervals
                .iter()
                .find(|iv| iv.start > t)
                .map(|next| (SessionState::Closed, next.kind.open_event(), next.start)),
        };

        let Some((status, next_event, boundary)) = resolved else {
            return SessionStatus {
                market: Some(self.def.id),
                status: SessionState::Closed,
                is_open: false,
                minutes_until_change: 0,
                next_event_time: now,
                next_event: NextEvent::None,
                unknown: false,
            };
        };

        let next_event_time = self.at(boundary);
        SessionStatus {
            market: Some(self.def.id),
            status,
            is_open: status.is_open(),
            minutes_until_change: u32::try_from(whole_minutes_until(now, next_event_time))
                .unwrap_or(u32::MAX),
            next_event_time,
            next_event,
            unknown: false,
        }
    }
}

/// Derives the session status of `def` at `now`.
///
/// Pure and deterministic: the same inputs always produce the same status.
pub fn compute_status(def: &MarketDefinition, now: DateTime<Utc>) -> SessionStatus {
    MarketTimeline::new(def, now).status_at(now)
}
