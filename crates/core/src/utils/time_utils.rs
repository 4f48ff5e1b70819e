use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;

/// Minutes in one UTC day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Minutes in one week.
pub const MINUTES_PER_WEEK: i64 = 7 * MINUTES_PER_DAY;

/// Source of the current instant.
///
/// Every time-dependent service takes a `Clock` so tests can freeze or
/// advance time instead of reading the wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Day of week counted from Sunday (0 = Sunday .. 6 = Saturday).
pub fn weekday_from_sunday(instant: DateTime<Utc>) -> i64 {
    i64::from(instant.weekday().num_days_from_sunday())
}

/// Converts a decimal hour (possibly above 24) into whole minutes.
pub fn decimal_hours_to_minutes(hours: f64) -> i64 {
    (hours * 60.0).round() as i64
}

/// Returns the instant of the most recent Sunday 00:00 UTC at or before `instant`.
pub fn start_of_utc_week(instant: DateTime<Utc>) -> DateTime<Utc> {
    let days_back = weekday_from_sunday(instant);
    let midnight: NaiveDateTime = instant
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| instant.naive_utc());
    midnight.and_utc() - Duration::days(days_back)
}

/// Whole minutes from `from` until `to`, floored and clamped at zero.
pub fn whole_minutes_until(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().max(0) / 60
}

/// Converts a UTC instant into a market's local wall time for display.
///
/// This is the only place a time zone is applied. Session math never calls it.
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}
