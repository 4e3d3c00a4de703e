//! Civil calendar logic for the center.
//!
//! Attendance ledgers are partitioned by the calendar day in the center's
//! own timezone, not by UTC midnight: a check-in at 23:30 local on the 15th
//! belongs to the 15th regardless of where the server runs. Everything that
//! needs "today" goes through this module.

use chrono::{DateTime, Utc};
use chrono_tz::Africa::Cairo;
use chrono_tz::Tz;

/// The fixed timezone the center operates in.
pub const CENTER_TZ: Tz = Cairo;

/// Civil date key (`YYYY-MM-DD`) of the given instant in the center's
/// timezone.
pub fn civil_date_key(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&CENTER_TZ).format("%Y-%m-%d").to_string()
}

/// Civil date key of the current moment.
pub fn today_key() -> String {
    civil_date_key(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn late_utc_evening_rolls_to_next_local_day() {
        // 22:30 UTC in winter is 00:30 the next day in Cairo (UTC+2)
        let instant = Utc.with_ymd_and_hms(2026, 1, 15, 22, 30, 0).unwrap();
        assert_eq!(civil_date_key(instant), "2026-01-16");
    }

    #[test]
    fn early_utc_morning_stays_on_same_local_day() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 15, 6, 0, 0).unwrap();
        assert_eq!(civil_date_key(instant), "2026-01-15");
    }

    #[test]
    fn summer_offset_is_respected() {
        // Egypt observes DST; 21:30 UTC in July is 00:30 the next day (UTC+3)
        let instant = Utc.with_ymd_and_hms(2026, 7, 1, 21, 30, 0).unwrap();
        assert_eq!(civil_date_key(instant), "2026-07-02");
    }

    #[test]
    fn key_format_is_sortable() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(civil_date_key(instant), "2026-03-05");
    }
}
