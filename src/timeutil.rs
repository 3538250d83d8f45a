//! Date and time arithmetic.
//!
//! Pure helpers for converting between calendar (date, wall-clock time)
//! pairs and absolute instants, minute-granular duration math, and the
//! string formats used by the persistence boundary.
//!
//! # Time Model
//! All instants are timezone-naive (`chrono::NaiveDateTime`): a calendar
//! date plus a wall-clock time, with no DST adjustment. The consumer
//! decides what locality the calendar refers to.
//!
//! # Invalid Input
//! Parsing never panics and never errors: malformed input yields `None`
//! so callers can keep rendering with partial data.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Seconds per minute, used when rounding spans to whole minutes.
const SECS_PER_MINUTE: i64 = 60;

/// Combines a calendar date and a wall-clock time into an instant.
#[inline]
pub fn to_instant(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

/// Shifts an instant by a signed number of minutes.
#[inline]
pub fn add_minutes(instant: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    instant + Duration::minutes(minutes)
}

/// Shifts a calendar date by a signed number of days.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64)).unwrap_or(date)
    } else {
        date.checked_sub_days(Days::new(-days as u64)).unwrap_or(date)
    }
}

/// Whole minutes between two instants, rounded to nearest and clamped to
/// zero.
///
/// A non-positive span yields 0, which doubles as the signal for an
/// inverted window.
pub fn duration_minutes(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let secs = (end - start).num_seconds();
    if secs <= 0 {
        return 0;
    }
    // Round half up to the nearest whole minute.
    (secs + SECS_PER_MINUTE / 2) / SECS_PER_MINUTE
}

/// Parses a `YYYY-MM-DD` calendar date. Malformed input yields `None`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Parses a `HH:MM` or `HH:MM:SS` wall-clock time. Malformed input yields
/// `None`.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Parses a combined instant in either `YYYY-MM-DDTHH:MM[:SS]` or
/// `YYYY-MM-DD HH:MM[:SS]` form.
///
/// The space-separated form is what the persistence layer emits; it is
/// normalized to the `T` separator before parsing.
pub fn parse_instant(value: &str) -> Option<NaiveDateTime> {
    let cleaned = value.trim().replacen(' ', "T", 1);
    NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Formats a date as `YYYY-MM-DD` for date inputs and payloads.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats a time as `HH:MM` for time inputs.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Formats an instant as `YYYY-MM-DD HH:MM:SS`, the persisted form.
pub fn format_instant(instant: NaiveDateTime) -> String {
    instant.format("%Y-%m-%d %H:%M:%S").to_string()
}
