//! Time utilities: facility-local clock labels and "today" resolution.
//!
//! Task events arrive as bare `HH:MM` labels in the facility's single
//! timezone. Everything downstream works in minutes since local midnight;
//! times are same-day values and are never unwrapped across midnight.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::TimeError;

/// Minutes since local midnight.
pub type ClockMinutes = u32;

fn clock_re() -> Result<&'static Regex, TimeError> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})$"))
        .as_ref()
        .map_err(|e| TimeError::Pattern(e.to_string()))
}

/// Parse `H:MM` or `HH:MM` into minutes since midnight.
pub fn parse_clock_minutes(s: &str) -> Result<ClockMinutes, TimeError> {
    let trimmed = s.trim();
    let caps = clock_re()?
        .captures(trimmed)
        .ok_or_else(|| TimeError::Malformed(s.to_string()))?;

    let hours: u32 = caps[1]
        .parse()
        .map_err(|_| TimeError::Malformed(s.to_string()))?;
    let minutes: u32 = caps[2]
        .parse()
        .map_err(|_| TimeError::Malformed(s.to_string()))?;

    if hours > 23 || minutes > 59 {
        return Err(TimeError::OutOfRange(s.to_string()));
    }

    Ok(hours * 60 + minutes)
}

/// Lenient form used by the pipeline: malformed labels mean "no time data".
pub fn clock_minutes(s: Option<&str>) -> Option<ClockMinutes> {
    s.and_then(|s| parse_clock_minutes(s).ok())
}

/// Render minutes since midnight back to `HH:MM`.
pub fn format_clock(minutes: ClockMinutes) -> String {
    format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
}

/// Milliseconds since local midnight for a wall-clock instant.
pub fn millis_since_midnight(t: NaiveTime) -> i64 {
    use chrono::Timelike;
    i64::from(t.num_seconds_from_midnight()) * 1000 + i64::from(t.nanosecond() / 1_000_000)
}

pub fn parse_timezone(tz: &str) -> Result<Tz, TimeError> {
    tz.parse()
        .map_err(|_| TimeError::InvalidTimezone(tz.to_string()))
}

/// The facility's calendar date at `now_utc`.
pub fn facility_today(tz: Tz, now_utc: DateTime<Utc>) -> NaiveDate {
    now_utc.with_timezone(&tz).date_naive()
}

/// The facility's wall-clock time at `now_utc`.
pub fn facility_now(tz: Tz, now_utc: DateTime<Utc>) -> NaiveTime {
    now_utc.with_timezone(&tz).time()
}

/// Date label as the task endpoint expects it (e.g. `%d.%m.%Y`).
pub fn date_label(date: NaiveDate, fmt: &str) -> String {
    date.format(fmt).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_padded_and_unpadded_hours() {
        assert_eq!(parse_clock_minutes("10:00"), Ok(600));
        assert_eq!(parse_clock_minutes("9:05"), Ok(545));
        assert_eq!(parse_clock_minutes(" 09:05 "), Ok(545));
        assert_eq!(parse_clock_minutes("00:00"), Ok(0));
        assert_eq!(parse_clock_minutes("23:59"), Ok(1439));
    }

    #[test]
    fn rejects_malformed_labels() {
        for bad in ["", "10", "10:0", "10:000", "ab:cd", "10-00", "10:00:00", "-1:00"] {
            assert!(
                matches!(parse_clock_minutes(bad), Err(TimeError::Malformed(_))),
                "expected malformed for {bad:?}"
            );
        }
    }

    #[test]
    fn clock_pattern_compiles() {
        assert!(clock_re().is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(parse_clock_minutes("24:00"), Err(TimeError::OutOfRange(_))));
        assert!(matches!(parse_clock_minutes("12:60"), Err(TimeError::OutOfRange(_))));
    }

    #[test]
    fn lenient_form_maps_errors_to_none() {
        assert_eq!(clock_minutes(Some("10:20")), Some(620));
        assert_eq!(clock_minutes(Some("soon")), None);
        assert_eq!(clock_minutes(None), None);
    }

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(545), "09:05");
        assert_eq!(format_clock(601), "10:01");
    }

    #[test]
    fn facility_today_crosses_utc_date_line() {
        // 22:30 UTC is already the next day in Moscow (UTC+3)
        let tz = parse_timezone("Europe/Moscow").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 22, 30, 0).unwrap();
        assert_eq!(facility_today(tz, now), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(facility_now(tz, now), NaiveTime::from_hms_opt(1, 30, 0).unwrap());
    }

    #[test]
    fn invalid_timezone_is_an_error() {
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn date_label_uses_format() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(date_label(d, "%d.%m.%Y"), "07.03.2026");
    }
}
