// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable time formatting for log entries and status output.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Format seconds as a short human-readable duration: `"5s"`, `"2m"`, `"1h30m"`, `"3d"`.
///
/// For the hours range, minutes are included when non-zero (e.g. `"1h"` vs `"1h5m"`).
pub fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        let m = secs / 60;
        let s = secs % 60;
        if s > 0 {
            format!("{}m{}s", m, s)
        } else {
            format!("{}m", m)
        }
    } else if secs < 86400 {
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        if m > 0 {
            format!("{}h{}m", h, m)
        } else {
            format!("{}h", h)
        }
    } else {
        format!("{}d", secs / 86400)
    }
}

/// Format a millisecond span between two epoch timestamps.
pub fn format_span_ms(start_ms: u64, end_ms: u64) -> String {
    format_elapsed(end_ms.saturating_sub(start_ms) / 1000)
}

/// Wall-clock time of day used as the prefix of every job log entry (`"14:03:07"`).
///
/// Rendered in the daemon's local timezone, matching what an operator reading
/// the dashboard expects.
pub fn log_timestamp(epoch_ms: u64) -> String {
    local_datetime(epoch_ms)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// Full local date and time (`"2026-10-19 14:03:07"`) for status displays.
pub fn format_datetime(epoch_ms: u64) -> String {
    local_datetime(epoch_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// RFC 3339 UTC timestamp, used in JSON output.
pub fn format_rfc3339(epoch_ms: u64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms as i64).map(|dt| dt.to_rfc3339())
}

fn local_datetime(epoch_ms: u64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(epoch_ms as i64).single()
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
