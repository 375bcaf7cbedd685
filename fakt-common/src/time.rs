//! Time zone and timestamp utilities
//!
//! Event dates are interpreted in a single configured IANA time zone. The zone
//! is resolved once at startup; an unknown name is a configuration error.

use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Default zone used when none is configured
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Resolve an IANA time zone name
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| Error::TimeZone {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

/// Attach a time zone to a wall-clock date/time.
///
/// Local times skipped by a DST transition, or repeated by one, are rejected
/// rather than guessed.
pub fn localize(tz: &Tz, naive: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.fixed_offset()),
        LocalResult::Ambiguous(..) => Err(Error::LocalTime {
            time: naive.to_string(),
            zone: tz.to_string(),
            problem: "ambiguous",
        }),
        LocalResult::None => Err(Error::LocalTime {
            time: naive.to_string(),
            zone: tz.to_string(),
            problem: "nonexistent",
        }),
    }
}

/// Midnight at the start of `date` in `tz`, as UTC.
///
/// Falls back to the earliest valid instant of the day when midnight itself
/// is skipped by a DST transition.
pub fn start_of_day(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => (0..24)
            .filter_map(|h| date.and_hms_opt(h, 0, 0))
            .find_map(|t| tz.from_local_datetime(&t).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
    }
}

/// Start of the current local day in `tz`, as UTC
pub fn start_of_today(tz: &Tz) -> DateTime<Utc> {
    start_of_day(tz, now().with_timezone(tz).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Timelike};

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, min, 0).unwrap())
    }

    #[test]
    fn test_parse_timezone_valid() {
        let tz = parse_timezone("Europe/Berlin").unwrap();
        assert_eq!(tz, chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_parse_timezone_trims_whitespace() {
        assert!(parse_timezone("  UTC ").is_ok());
    }

    #[test]
    fn test_parse_timezone_invalid() {
        let err = parse_timezone("Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, Error::TimeZone { ref name, .. } if name == "Mars/Olympus_Mons"));
    }

    #[test]
    fn test_localize_winter_offset() {
        let tz = chrono_tz::Europe::Berlin;
        let dt = localize(&tz, naive(2024, 1, 15, 20, 0)).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 3600);
        assert_eq!(dt.hour(), 20);
    }

    #[test]
    fn test_localize_summer_offset() {
        let tz = chrono_tz::Europe::Berlin;
        let dt = localize(&tz, naive(2024, 7, 15, 20, 0)).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_localize_rejects_skipped_time() {
        // 2024-03-31 02:30 does not exist in Berlin (clocks jump 02:00 -> 03:00)
        let tz = chrono_tz::Europe::Berlin;
        let err = localize(&tz, naive(2024, 3, 31, 2, 30)).unwrap_err();
        assert!(matches!(err, Error::LocalTime { problem: "nonexistent", .. }));
    }

    #[test]
    fn test_localize_rejects_ambiguous_time() {
        // 2024-10-27 02:30 occurs twice in Berlin
        let tz = chrono_tz::Europe::Berlin;
        let err = localize(&tz, naive(2024, 10, 27, 2, 30)).unwrap_err();
        assert!(matches!(err, Error::LocalTime { problem: "ambiguous", .. }));
    }

    #[test]
    fn test_start_of_day_in_zone() {
        let tz = chrono_tz::Europe::Berlin;
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let start = start_of_day(&tz, date);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 14, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_start_of_today_not_in_future() {
        let tz = chrono_tz::UTC;
        assert!(start_of_today(&tz) <= now());
    }
}
