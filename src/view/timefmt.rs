//! Timestamp parsing and display formatting for the table and detail panel.
//!
//! All inputs are the normalized ISO-8601 text produced at the store
//! boundary. Anything that fails to parse degrades to a placeholder dash
//! (display) or the earliest possible instant (sort), never an error.

use chrono::{DateTime, Utc};

/// Placeholder for values that are absent or fail to parse.
pub const DASH: &str = "—";

/// Non-breaking blank shown in place of relative times before the client
/// has mounted, so server-rendered and client-rendered output match.
pub const BLANK: &str = "\u{a0}";

/// Parse normalized timestamp text.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Numeric sort key for a timestamp column. Unparseable values sort as
/// the earliest possible value.
pub fn sort_key(text: &str) -> i64 {
    parse_timestamp(text)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(i64::MIN)
}

/// Absolute formatted timestamp, e.g. `Mar 1, 2025, 09:15`.
pub fn format_absolute(text: &str) -> String {
    match parse_timestamp(text) {
        Some(dt) => dt.format("%b %-d, %Y, %H:%M").to_string(),
        None => DASH.to_string(),
    }
}

/// Relative "time ago" text, `None` when the input does not parse.
pub fn relative_from(text: &str, now: DateTime<Utc>) -> Option<String> {
    let instant = parse_timestamp(text)?;
    let secs = (now - instant).num_seconds();
    if secs < 45 {
        // Covers small negative skew between client and store clocks
        return Some("just now".to_string());
    }

    let (count, unit) = if secs < 90 {
        (1, "minute")
    } else if secs < 3_600 {
        (secs / 60, "minute")
    } else if secs < 86_400 {
        (secs / 3_600, "hour")
    } else if secs < 604_800 {
        (secs / 86_400, "day")
    } else if secs < 2_592_000 {
        (secs / 604_800, "week")
    } else if secs < 31_536_000 {
        (secs / 2_592_000, "month")
    } else {
        (secs / 31_536_000, "year")
    };

    if count == 1 {
        Some(format!("1 {unit} ago"))
    } else {
        Some(format!("{count} {unit}s ago"))
    }
}

/// Relative text for a table cell: blank until live-time display is
/// enabled, dash when the value does not parse.
pub fn relative_or_blank(text: &str, live_time: bool, now: DateTime<Utc>) -> String {
    if !live_time {
        return BLANK.to_string();
    }
    relative_from(text, now).unwrap_or_else(|| DASH.to_string())
}
