//! Minute-based time conversion helpers.
//!
//! All engine arithmetic happens on whole minutes. These helpers convert
//! between minutes, hour/minute pairs, and the textual cells found in logs.

use std::sync::LazyLock;

use chrono::{NaiveTime, Timelike};
use regex::Regex;
use thiserror::Error;

/// Durations and clock times are expressed in whole minutes.
pub type Minutes = i64;

/// Minutes in one calendar week.
pub const WEEK_MINUTES: Minutes = 7 * 24 * 60;

/// Pre-compiled regex for "1h30m" / "2h" / "45m" style durations.
static HOURS_MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)\s*h)?\s*(?:(\d+)\s*m(?:in)?)?$").expect("valid duration regex")
});

/// Errors from parsing time cells.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    /// The cell is not a recognised clock time.
    #[error("invalid clock time: {0:?} (expected HH:MM)")]
    InvalidClock(String),
    /// The cell is not a recognised duration.
    #[error("invalid duration: {0:?} (expected H:MM, 1h30m, 90m or minutes)")]
    InvalidDuration(String),
}

/// Converts an hour/minute pair to minutes.
pub const fn to_minutes(hours: i64, minutes: i64) -> Minutes {
    hours * 60 + minutes
}

/// Splits minutes into an `(hours, minutes)` pair.
///
/// Hours truncate toward zero so the sign is carried by both parts, e.g.
/// `-90 -> (-1, -30)`.
pub const fn to_hours_minutes(minutes: Minutes) -> (i64, i64) {
    (minutes / 60, minutes % 60)
}

/// Parses an `HH:MM` clock cell into minutes after midnight.
pub fn parse_clock(cell: &str) -> Result<Minutes, TimeParseError> {
    let trimmed = cell.trim();
    let time = NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|_| TimeParseError::InvalidClock(cell.to_string()))?;
    Ok(to_minutes(i64::from(time.hour()), i64::from(time.minute())))
}

/// Parses a duration cell into minutes.
///
/// Accepts `H:MM`, `1h30m`, `2h`, `45m`, and plain integer minutes. An empty
/// cell is zero.
pub fn parse_duration(cell: &str) -> Result<Minutes, TimeParseError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    if let Ok(minutes) = trimmed.parse::<Minutes>() {
        return Ok(minutes);
    }

    if let Some((hours, minutes)) = trimmed.split_once(':') {
        let hours: i64 = hours
            .parse()
            .map_err(|_| TimeParseError::InvalidDuration(cell.to_string()))?;
        let minutes: i64 = minutes
            .parse()
            .map_err(|_| TimeParseError::InvalidDuration(cell.to_string()))?;
        if !(0..60).contains(&minutes) {
            return Err(TimeParseError::InvalidDuration(cell.to_string()));
        }
        return Ok(to_minutes(hours, minutes));
    }

    let caps = HOURS_MINUTES_RE
        .captures(trimmed)
        .ok_or_else(|| TimeParseError::InvalidDuration(cell.to_string()))?;
    let hours = caps.get(1).map(|m| m.as_str().parse::<i64>());
    let minutes = caps.get(2).map(|m| m.as_str().parse::<i64>());
    match (hours, minutes) {
        (None, None) => Err(TimeParseError::InvalidDuration(cell.to_string())),
        (hours, minutes) => {
            let hours = hours
                .transpose()
                .map_err(|_| TimeParseError::InvalidDuration(cell.to_string()))?
                .unwrap_or(0);
            let minutes = minutes
                .transpose()
                .map_err(|_| TimeParseError::InvalidDuration(cell.to_string()))?
                .unwrap_or(0);
            Ok(to_minutes(hours, minutes))
        }
    }
}

/// Formats minutes as "Xh Ym" (or "Ym" under an hour), keeping the sign.
pub fn format_duration(minutes: Minutes) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let (hours, rest) = to_hours_minutes(minutes.abs());
    if hours >= 1 {
        format!("{sign}{hours}h {rest}m")
    } else {
        format!("{sign}{rest}m")
    }
}
