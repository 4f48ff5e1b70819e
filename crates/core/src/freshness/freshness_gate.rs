//! Pure freshness predicates.

use chrono::{DateTime, Datelike, Duration, Utc};

use super::freshness_model::RefreshPolicy;

/// ISO-8601 `(year, week)` of the UTC date of `instant`.
pub fn iso_week_key(instant: DateTime<Utc>) -> (i32, u32) {
    let week = instant.iso_week();
    (week.year(), week.week())
}

/// Decides whether a feed last fetched at `last_fetch` is due at `now`.
///
/// A feed that was never fetched is always due. A `last_fetch` in the future
/// (wall clock moved backwards) is treated as due rather than blocking
/// refreshes until the clock catches up.
pub fn should_refresh(
    last_fetch: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    policy: RefreshPolicy,
) -> bool {
    let Some(last_fetch) = last_fetch else {
        return true;
    };
    if last_fetch > now {
        return true;
    }

    let elapsed = now - last_fetch;
    match policy {
        RefreshPolicy::EveryNMinutes { minutes } => elapsed >= Duration::minutes(i64::from(minutes)),
        RefreshPolicy::OnceRollingHours { hours } => elapsed >= Duration::hours(i64::from(hours)),
        RefreshPolicy::OncePerIsoWeek => iso_week_key(last_fetch) != iso_week_key(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_never_fetched_is_due() {
        assert!(should_refresh(None, at(2024, 1, 15, 12), RefreshPolicy::OncePerIsoWeek));
    }

    #[test]
    fn test_iso_week_same_week_across_year_end_is_not_due() {
        // Dec 30 2024 is Monday of 2025-W01
        assert_eq!(iso_week_key(at(2024, 12, 30, 8)), (2025, 1));
        assert!(!should_refresh(
            Some(at(2024, 12, 30, 8)),
            at(2025, 1, 2, 8),
            RefreshPolicy::OncePerIsoWeek
        ));
    }

    #[test]
    fn test_iso_week_rollover_is_due() {
        // Dec 29 2024 is Sunday of 2024-W52
        assert_eq!(iso_week_key(at(2024, 12, 29, 23)), (2024, 52));
        assert!(should_refresh(
            Some(at(2024, 12, 29, 23)),
            at(2024, 12, 30, 0),
            RefreshPolicy::OncePerIsoWeek
        ));
    }

    #[test]
    fn test_iso_week_same_number_different_year_is_due() {
        // 2020-W53 vs 2026-W53
        let last = at(2020, 12, 31, 12);
        let now = at(2026, 12, 31, 12);
        assert_eq!(iso_week_key(last).1, iso_week_key(now).1);
        assert!(should_refresh(Some(last), now, RefreshPolicy::OncePerIsoWeek));
    }

    #[test]
    fn test_iso_week_within_week_is_not_due() {
        // Monday morning to Sunday night of the same ISO week
        assert!(!should_refresh(
            Some(at(2024, 1, 15, 0)),
            at(2024, 1, 21, 23),
            RefreshPolicy::OncePerIsoWeek
        ));
    }

    #[test]
    fn test_rolling_hours_boundary() {
        let policy = RefreshPolicy::OnceRollingHours { hours: 24 };
        let last = at(2024, 1, 15, 12);
        assert!(!should_refresh(Some(last), at(2024, 1, 16, 11), policy));
        assert!(should_refresh(Some(last), at(2024, 1, 16, 12), policy));
    }

    #[test]
    fn test_every_n_minutes_boundary() {
        let policy = RefreshPolicy::EveryNMinutes { minutes: 5 };
        let last = at(2024, 1, 15, 12);
        assert!(!should_refresh(Some(last), last + Duration::minutes(4), policy));
        assert!(should_refresh(Some(last), last + Duration::minutes(5), policy));
    }

    #[test]
    fn test_future_last_fetch_is_due() {
        let policy = RefreshPolicy::OnceRollingHours { hours: 24 };
        assert!(should_refresh(
            Some(at(2024, 1, 16, 12)),
            at(2024, 1, 15, 12),
            policy
        ));
    }
}
