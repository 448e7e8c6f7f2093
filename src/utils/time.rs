// src/utils/time.rs

use chrono::{DateTime, NaiveDateTime};

/// Formats whole seconds as `mm:ss`, zero-padded. Minutes are not capped at 59.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Formats an optional duration as `Xm Ys`, or `N/A` when absent.
pub fn format_duration(seconds: Option<u64>) -> String {
    match seconds {
        Some(s) => format!("{}m {}s", s / 60, s % 60),
        None => "N/A".to_string(),
    }
}

/// Renders a server timestamp as `YYYY-MM-DD HH:MM`.
///
/// Accepts RFC 3339 and naive ISO-8601 (with or without fractional seconds);
/// anything else is returned untouched.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}
