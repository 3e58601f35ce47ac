//! Minutes-since-midnight arithmetic.
//!
//! Quiet-hours suppression and digest-time matching both reduce to
//! comparing a UTC clock time against a configured `"HH:mm"` value. The
//! comparison lives here so the two features cannot drift apart.
//!
//! All arithmetic is UTC wall-clock only; stored timezones are not applied.

use chrono::Timelike;

use crate::types::Timestamp;

/// Minutes in a day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Parse an `"HH:mm"` string into minutes since midnight.
///
/// Returns `None` for anything that is not a zero-padded or unpadded
/// 24-hour clock time (`"9:05"` and `"09:05"` both parse; `"24:00"` does
/// not).
pub fn parse_hhmm(s: &str) -> Option<u16> {
    let (hours, minutes) = s.split_once(':')?;
    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Minutes since midnight of a UTC timestamp.
pub fn minutes_of(t: &Timestamp) -> u16 {
    (t.hour() * 60 + t.minute()) as u16
}

/// The hour bucket (0–23) of a minutes-since-midnight value.
pub fn hour_of(minutes: u16) -> u16 {
    minutes / 60
}

/// Whether `now` falls inside the half-open window `[start, end)`.
///
/// When `start >= end` the window wraps midnight and membership is
/// `now >= start || now < end`. The upper bound is always exclusive, so a
/// window ending at `"17:00"` does not suppress at 17:00 exactly.
pub fn in_window(now: u16, start: u16, end: u16) -> bool {
    if start < end {
        now >= start && now < end
    } else {
        now >= start || now < end
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_and_unpadded() {
        assert_eq!(parse_hhmm("09:05"), Some(545));
        assert_eq!(parse_hhmm("9:05"), Some(545));
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("12:60"), None);
        assert_eq!(parse_hhmm("noon"), None);
        assert_eq!(parse_hhmm("12"), None);
        assert_eq!(parse_hhmm(""), None);
    }

    #[test]
    fn non_wrapping_window_is_half_open() {
        let start = parse_hhmm("09:00").unwrap();
        let end = parse_hhmm("17:00").unwrap();
        assert!(in_window(parse_hhmm("10:00").unwrap(), start, end));
        assert!(in_window(start, start, end));
        assert!(!in_window(parse_hhmm("08:59").unwrap(), start, end));
        // Upper bound is exclusive.
        assert!(!in_window(end, start, end));
    }

    #[test]
    fn wrapping_window_spans_midnight() {
        let start = parse_hhmm("22:00").unwrap();
        let end = parse_hhmm("08:00").unwrap();
        assert!(in_window(parse_hhmm("23:00").unwrap(), start, end));
        assert!(in_window(parse_hhmm("03:00").unwrap(), start, end));
        assert!(!in_window(parse_hhmm("12:00").unwrap(), start, end));
        assert!(!in_window(end, start, end));
    }

    #[test]
    fn minutes_of_timestamp() {
        let t: Timestamp = "2026-03-01T14:30:59Z".parse().unwrap();
        assert_eq!(minutes_of(&t), 14 * 60 + 30);
        assert_eq!(hour_of(minutes_of(&t)), 14);
    }
}
