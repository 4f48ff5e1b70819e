//! Tests for the session clock and regional aggregation.

use super::*;
use crate::utils::time_utils::FixedClock;
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use std::sync::Arc;

// January 2024: Sat 13, Sun 14, Mon 15, Tue 16, Fri 19, Sat 20, Sun 21, Mon 22.
fn utc(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
}

fn service_at(now: DateTime<Utc>) -> MarketSessionService {
    let table = Arc::new(MarketTable::builtin().unwrap());
    MarketSessionService::new(table, Arc::new(FixedClock::new(now)))
}

fn status(market: &str, now: DateTime<Utc>) -> SessionStatus {
    service_at(now).get_market_status(market)
}

// ============================================================================
// Single market
// ============================================================================

mod single_market_tests {
    use super::*;

    #[test]
    fn test_us_monday_afternoon_is_open() {
        let s = status("US", utc(15, 15, 0));
        assert_eq!(s.status, SessionState::Open);
        assert!(s.is_open);
        assert_eq!(s.next_event, NextEvent::RegularClose);
        assert_eq!(s.minutes_until_change, 360);
        assert_eq!(s.next_event_time, utc(15, 21, 0));
        assert_eq!(s.market, Some(MarketId::Us));
        assert!(!s.unknown);
    }

    #[test]
    fn test_us_saturday_morning_waits_for_futures() {
        let s = status("US", utc(13, 10, 0));
        assert_eq!(s.status, SessionState::Closed);
        assert!(!s.is_open);
        assert_eq!(s.next_event, NextEvent::FuturesOpen);
        assert_eq!(s.next_event_time, utc(14, 23, 0));
        assert_eq!(s.minutes_until_change, 37 * 60);
    }

    #[test]
    fn test_us_saturday_noon_countdown_lands_on_futures_open() {
        let now = utc(13, 12, 0);
        let s = status("US", now);
        assert_eq!(s.status, SessionState::Closed);
        assert_eq!(s.next_event, NextEvent::FuturesOpen);
        assert_eq!(s.minutes_until_change, 35 * 60);
        assert_eq!(
            now + Duration::minutes(i64::from(s.minutes_until_change)),
            utc(14, 23, 0)
        );
    }

    #[test]
    fn test_us_sunday_before_futures_is_closed() {
        let s = status("US", utc(14, 20, 0));
        assert_eq!(s.status, SessionState::Closed);
        assert_eq!(s.next_event, NextEvent::FuturesOpen);
        assert_eq!(s.minutes_until_change, 180);
    }

    #[test]
    fn test_us_sunday_evening_trades_futures() {
        let s = status("US", utc(14, 23, 30));
        assert_eq!(s.status, SessionState::Futures);
        assert!(s.is_open);
        assert_eq!(s.next_event, NextEvent::RegularClose);
        assert_eq!(s.next_event_time, utc(15, 21, 0));
        assert_eq!(s.minutes_until_change, 1290);
    }

    #[test]
    fn test_us_futures_stop_at_monday_midnight() {
        let s = status("US", utc(14, 23, 59));
        assert_eq!(s.status, SessionState::Futures);

        let s = status("US", utc(15, 0, 0));
        assert_eq!(s.status, SessionState::Closed);
        assert!(!s.is_open);
        assert_eq!(s.next_event, NextEvent::PreMarketOpen);
        assert_eq!(s.next_event_time, utc(15, 9, 0));
    }

    #[test]
    fn test_us_monday_overnight_is_closed_until_pre_market() {
        let s = status("US", utc(15, 3, 0));
        assert_eq!(s.status, SessionState::Closed);
        assert_eq!(s.next_event, NextEvent::PreMarketOpen);
        assert_eq!(s.minutes_until_change, 360);
    }

    #[test]
    fn test_us_pre_market_counts_down_to_open() {
        let s = status("US", utc(15, 10, 0));
        assert_eq!(s.status, SessionState::Pre);
        assert!(!s.is_open);
        assert_eq!(s.next_event, NextEvent::RegularOpen);
        assert_eq!(s.minutes_until_change, 270);
    }

    #[test]
    fn test_us_regular_open_boundary_is_inclusive() {
        let s = status("US", utc(15, 14, 30));
        assert_eq!(s.status, SessionState::Open);
        assert_eq!(s.minutes_until_change, 390);
    }

    #[test]
    fn test_us_after_hours_runs_past_midnight() {
        let evening = status("US", utc(15, 22, 0));
        assert_eq!(evening.status, SessionState::Post);
        assert_eq!(evening.next_event, NextEvent::AfterHoursClose);
        assert_eq!(evening.next_event_time, utc(16, 1, 0));
        assert_eq!(evening.minutes_until_change, 180);

        let after_midnight = status("US", utc(16, 0, 30));
        assert_eq!(after_midnight.status, SessionState::Post);
        assert_eq!(after_midnight.minutes_until_change, 30);
    }

    #[test]
    fn test_us_closed_between_after_hours_and_pre_market() {
        let s = status("US", utc(16, 1, 0));
        assert_eq!(s.status, SessionState::Closed);
        assert_eq!(s.next_event, NextEvent::PreMarketOpen);
        assert_eq!(s.minutes_until_change, 480);
    }

    #[test]
    fn test_friday_after_hours_never_spill_into_saturday() {
        let s = status("US", utc(19, 23, 30));
        assert_eq!(s.status, SessionState::Post);
        assert_eq!(s.next_event, NextEvent::AfterHoursClose);
        assert_eq!(s.next_event_time, utc(20, 0, 0));
        assert_eq!(s.minutes_until_change, 30);

        for (hour, minute) in [(0, 0), (0, 30), (1, 0), (12, 0)] {
            let s = status("US", utc(20, hour, minute));
            assert_eq!(s.status, SessionState::Closed);
            assert!(!s.is_open);
            assert_eq!(s.next_event, NextEvent::FuturesOpen);
            assert_eq!(s.next_event_time, utc(21, 23, 0));
        }
    }

    #[test]
    fn test_market_without_extended_hours_skips_weekend() {
        // BIST 07:00-15:00 UTC, Friday evening rolls to Monday open
        let s = status("BIST", utc(19, 16, 0));
        assert_eq!(s.status, SessionState::Closed);
        assert_eq!(s.next_event, NextEvent::RegularOpen);
        assert_eq!(s.next_event_time, utc(22, 7, 0));
        assert_eq!(s.minutes_until_change, 63 * 60);
    }

    #[test]
    fn test_market_opening_at_midnight_utc() {
        let friday_close = status("TOKYO", utc(19, 7, 0));
        assert_eq!(friday_close.status, SessionState::Closed);
        assert_eq!(friday_close.next_event_time, utc(22, 0, 0));

        let monday_open = status("TOKYO", utc(22, 0, 0));
        assert_eq!(monday_open.status, SessionState::Open);
        assert_eq!(monday_open.minutes_until_change, 390);
    }

    #[test]
    fn test_unknown_market_is_safe_default() {
        let now = utc(15, 15, 0);
        let s = status("NASDAQ100", now);
        assert!(s.unknown);
        assert_eq!(s.market, None);
        assert_eq!(s.status, SessionState::Closed);
        assert!(!s.is_open);
        assert_eq!(s.minutes_until_change, 0);
        assert_eq!(s.next_event, NextEvent::None);
        assert_eq!(s.next_event_time, now);
    }

    #[test]
    fn test_market_id_parsing_is_case_insensitive() {
        assert_eq!("us".parse::<MarketId>().unwrap(), MarketId::Us);
        assert_eq!(" Tokyo ".parse::<MarketId>().unwrap(), MarketId::Tokyo);
        assert!("LSE".parse::<MarketId>().is_err());
    }

    #[test]
    fn test_is_market_open_matches_status() {
        let service = service_at(utc(15, 15, 0));
        assert!(service.is_market_open("US"));
        assert!(!service.is_market_open("BIST"));
        assert!(!service.is_market_open("unknown"));
        assert!(service.is_market_open_at("BIST", utc(15, 8, 0)));
    }

    #[test]
    fn test_status_is_idempotent() {
        let service = service_at(utc(15, 15, 0));
        let now = utc(16, 0, 30);
        assert_eq!(
            service.get_market_status_at("US", now),
            service.get_market_status_at("US", now)
        );
    }

    #[test]
    fn test_countdown_decreases_minute_by_minute() {
        let start = utc(15, 15, 0);
        let service = service_at(start);
        for delta in 0..360 {
            let s = service.get_market_status_at("US", start + Duration::minutes(delta));
            assert_eq!(s.status, SessionState::Open);
            assert_eq!(i64::from(s.minutes_until_change), 360 - delta);
        }
        let flipped = service.get_market_status_at("US", start + Duration::minutes(360));
        assert_eq!(flipped.status, SessionState::Post);
    }

    #[test]
    fn test_partial_minute_is_floored() {
        let now = utc(15, 15, 0) + Duration::seconds(59);
        let s = service_at(now).get_market_status("US");
        assert_eq!(s.minutes_until_change, 359);
    }

    #[test]
    fn test_next_event_local_for_display() {
        let s = status("US", utc(15, 15, 0));
        let def = builtin_definition(MarketId::Us);
        let local = s.next_event_local(def.timezone);
        assert_eq!(local.hour(), 16);
        assert_eq!(local.minute(), 0);
    }

    #[test]
    fn test_status_serializes_with_short_names() {
        let s = status("US", utc(15, 15, 0));
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["status"], "open");
        assert_eq!(json["nextEvent"], "close");
        assert_eq!(json["isOpen"], true);
        assert_eq!(json["minutesUntilChange"], 360);
        assert_eq!(json["market"], "US");
    }
}

// ============================================================================
// Regional aggregation
// ============================================================================

mod regional_tests {
    use super::*;

    #[test]
    fn test_asia_pacific_countdown_tracks_last_open_market() {
        // 02:00 UTC Monday: Tokyo, HK, Seoul, Shanghai open; India opens 03:45
        let service = service_at(utc(15, 2, 0));
        let region = service.get_region_status(Region::AsiaPacific);
        assert_eq!(region.region, Some(Region::AsiaPacific));
        assert_eq!(region.label, RegionalLabel::Open);
        assert!(region.is_open);
        assert_eq!(
            region.open_markets,
            vec![
                MarketId::Tokyo,
                MarketId::HongKong,
                MarketId::Seoul,
                MarketId::Shanghai
            ]
        );
        // India is the last to close, at 10:00
        assert_eq!(region.next_change_time, Some(utc(15, 10, 0)));
        assert_eq!(region.minutes_until_change, 480);
        assert_eq!(region.markets.len(), 5);
    }

    #[test]
    fn test_adhoc_region_ignores_closures_that_do_not_flip_label() {
        // Tokyo and Seoul close at 06:30, Hong Kong stays open until 08:00
        let service = service_at(utc(15, 5, 0));
        let region = service.get_regional_status(&["TOKYO", "HONGKONG", "SEOUL"]);
        assert_eq!(region.region, None);
        assert_eq!(region.label, RegionalLabel::Open);
        assert_eq!(region.minutes_until_change, 180);
        assert_eq!(region.next_change_time, Some(utc(15, 8, 0)));
    }

    #[test]
    fn test_region_closed_over_weekend_counts_to_first_open() {
        let service = service_at(utc(20, 12, 0));
        let region = service.get_region_status(Region::Europe);
        assert_eq!(region.label, RegionalLabel::Closed);
        assert!(!region.is_open);
        assert!(region.open_markets.is_empty());
        // BIST opens first on Monday at 07:00
        assert_eq!(region.next_change_time, Some(utc(22, 7, 0)));
        assert_eq!(region.minutes_until_change, 43 * 60);
    }

    #[test]
    fn test_extended_hours_make_region_partially_open() {
        let service = service_at(utc(15, 10, 0));
        let pre = service.get_region_status(Region::Americas);
        assert_eq!(pre.label, RegionalLabel::PartiallyOpen);
        assert!(!pre.is_open);
        assert_eq!(pre.minutes_until_change, 270);

        let post = service.get_region_status_at(Region::Americas, utc(15, 22, 0));
        assert_eq!(post.label, RegionalLabel::PartiallyOpen);
        assert_eq!(post.next_change_time, Some(utc(16, 1, 0)));
    }

    #[test]
    fn test_unknown_ids_are_carried_but_never_open() {
        let service = service_at(utc(15, 5, 0));
        let region = service.get_regional_status(&["TOKYO", "MOON"]);
        assert_eq!(region.markets.len(), 2);
        assert!(region.markets[1].unknown);
        assert_eq!(region.label, RegionalLabel::Open);
        assert_eq!(region.open_markets, vec![MarketId::Tokyo]);
        assert_eq!(region.next_change_time, Some(utc(15, 6, 30)));
    }

    #[test]
    fn test_region_of_only_unknown_ids_is_closed_without_countdown() {
        let service = service_at(utc(15, 5, 0));
        let region = service.get_regional_status(&["MOON", "MARS"]);
        assert_eq!(region.label, RegionalLabel::Closed);
        assert_eq!(region.minutes_until_change, 0);
        assert_eq!(region.next_change_time, None);
    }

    #[test]
    fn test_region_sees_futures_ending_at_monday_midnight() {
        // US futures report Monday's regular close, but the region flips
        // to closed as soon as the futures window ends.
        let service = service_at(utc(14, 23, 30));
        let region = service.get_region_status(Region::Americas);
        assert_eq!(region.label, RegionalLabel::Open);
        assert_eq!(region.markets[0].next_event_time, utc(15, 21, 0));
        assert_eq!(region.next_change_time, Some(utc(15, 0, 0)));
        assert_eq!(region.minutes_until_change, 30);
    }

    #[test]
    fn test_every_market_region_finds_first_label_change_all_week() {
        let ids: Vec<&str> = MarketId::ALL.iter().map(|id| id.as_str()).collect();
        let service = service_at(utc(14, 0, 0));
        for hour in 0..(7 * 24) {
            let now = utc(14, 0, 17) + Duration::hours(hour);
            let region = service.get_regional_status_at(&ids, now);
            let change = region
                .next_change_time
                .expect("a week always has a label change");
            assert!(change > now);
            assert_eq!(
                service
                    .get_regional_status_at(&ids, change - Duration::seconds(1))
                    .label,
                region.label,
                "label changed before {}",
                change
            );
            assert_ne!(
                service.get_regional_status_at(&ids, change).label,
                region.label,
                "label unchanged at {}",
                change
            );
        }
    }

    #[test]
    fn test_region_parsing() {
        assert_eq!("asia pacific".parse::<Region>().unwrap(), Region::AsiaPacific);
        assert_eq!("EUROPE".parse::<Region>().unwrap(), Region::Europe);
        assert!("antarctica".parse::<Region>().is_err());
    }
}
