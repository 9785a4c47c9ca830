//! Date resolution for loosely-typed date fields.
//!
//! Order of attempts:
//! 1. Native timestamp
//! 2. `d MMM yyyy 'at' HH:mm:ss 'UTC'Z` text (e.g. `5 Mar 2024 at 14:30:00 UTC+0100`)
//! 3. `d MMM yyyy` or `d MMMM yyyy` text, pinned to start of day in the
//!    reporting calendar
//!
//! Anything else is unresolved; the caller decides the fallback.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};

use crate::models::{DateSource, RawValue};

/// chrono pattern for the detailed text form.
pub const DETAILED_DATE_FORMAT: &str = "%d %b %Y at %H:%M:%S UTC%z";

/// chrono pattern for the day-only text form.
pub const DAY_DATE_FORMAT: &str = "%d %b %Y";

/// Day-only text with the month spelled out (`5 March 2024`).
pub const DAY_DATE_FORMAT_LONG: &str = "%d %B %Y";

/// Midnight of `date` in the calendar of `offset`.
pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<FixedOffset> {
    let midnight = date.and_time(NaiveTime::MIN);
    let utc = midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}

/// Midnight of the day containing `now`, in `now`'s calendar.
pub fn start_of_today(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    start_of_day(now.date_naive(), *now.offset())
}

/// Resolve a raw date value, expressing the result in `offset`'s calendar.
pub fn resolve_date(
    value: Option<&RawValue>,
    offset: FixedOffset,
) -> Option<(DateTime<FixedOffset>, DateSource)> {
    match value? {
        RawValue::Timestamp(ts) => Some((ts.with_timezone(&offset), DateSource::Timestamp)),
        RawValue::String(text) => parse_date_text(text.trim(), offset),
        _ => None,
    }
}

fn parse_date_text(
    text: &str,
    offset: FixedOffset,
) -> Option<(DateTime<FixedOffset>, DateSource)> {
    if let Ok(parsed) = DateTime::parse_from_str(text, DETAILED_DATE_FORMAT) {
        return Some((parsed.with_timezone(&offset), DateSource::DetailedText));
    }

    NaiveDate::parse_from_str(text, DAY_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(text, DAY_DATE_FORMAT_LONG))
        .ok()
        .map(|date| (start_of_day(date, offset), DateSource::DayText))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_day_text_with_full_month_name() {
        let value = RawValue::from("5 March 2024");
        let (date, source) = resolve_date(Some(&value), utc()).unwrap();
        assert_eq!(source, DateSource::DayText);
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_native_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let (date, source) = resolve_date(Some(&RawValue::Timestamp(ts)), utc()).unwrap();
        assert_eq!(date, ts);
        assert_eq!(source, DateSource::Timestamp);
    }

    #[test]
    fn test_detailed_text_with_offset() {
        let value = RawValue::from("5 Mar 2024 at 14:30:00 UTC+0100");
        let (date, source) = resolve_date(Some(&value), utc()).unwrap();
        assert_eq!(source, DateSource::DetailedText);
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 5, 13, 30, 0).unwrap());
        assert_eq!(date.hour(), 13);
    }

    #[test]
    fn test_detailed_text_two_digit_day() {
        let value = RawValue::from("15 Nov 2023 at 08:00:00 UTC+0000");
        let (date, _) = resolve_date(Some(&value), utc()).unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2023, 11, 15, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_day_text_is_start_of_local_day() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let value = RawValue::from("5 Mar 2024");
        let (date, source) = resolve_date(Some(&value), ist).unwrap();

        assert_eq!(source, DateSource::DayText);
        assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(date.hour(), 0);
        assert_eq!(date.offset(), &ist);
    }

    #[test]
    fn test_unparseable_and_wrong_type() {
        assert!(resolve_date(Some(&RawValue::from("next tuesday")), utc()).is_none());
        assert!(resolve_date(Some(&RawValue::from("2024-03-05")), utc()).is_none());
        assert!(resolve_date(Some(&RawValue::Number(1.0)), utc()).is_none());
        assert!(resolve_date(None, utc()).is_none());
    }

    #[test]
    fn test_start_of_today_keeps_calendar() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        // 02:00 UTC on the 6th is still the 5th at UTC-5
        let now = Utc
            .with_ymd_and_hms(2024, 3, 6, 2, 0, 0)
            .unwrap()
            .with_timezone(&offset);
        let today = start_of_today(now);
        assert_eq!(today.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(today.hour(), 0);
    }
}
