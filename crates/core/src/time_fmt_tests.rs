// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    zero_seconds      = { 0,      "0s" },
    max_seconds       = { 59,     "59s" },
    one_minute        = { 60,     "1m" },
    minute_and_second = { 61,     "1m1s" },
    max_minutes       = { 3599,   "59m59s" },
    one_hour          = { 3600,   "1h" },
    hour_and_minutes  = { 3660,   "1h1m" },
    almost_a_day      = { 86399,  "23h59m" },
    one_day           = { 86400,  "1d" },
    two_days          = { 172800, "2d" },
)]
fn elapsed(secs: u64, expected: &str) {
    assert_eq!(format_elapsed(secs), expected);
}

#[test]
fn span_saturates_when_end_precedes_start() {
    assert_eq!(format_span_ms(5_000, 1_000), "0s");
    assert_eq!(format_span_ms(1_000, 121_000), "2m");
}

#[test]
fn log_timestamp_is_time_of_day() {
    let ts = log_timestamp(1_700_000_000_000);
    assert_eq!(ts.len(), 8, "got: {ts}");
    let parts: Vec<&str> = ts.split(':').collect();
    assert_eq!(parts.len(), 3);
    assert!(parts.iter().all(|p| p.len() == 2 && p.parse::<u8>().is_ok()));
}

#[test]
fn rfc3339_is_utc() {
    assert_eq!(
        format_rfc3339(0).as_deref(),
        Some("1970-01-01T00:00:00+00:00")
    );
}

#[test]
fn datetime_has_date_and_time() {
    let dt = format_datetime(1_700_000_000_000);
    assert_eq!(dt.len(), 19, "got: {dt}");
    assert!(dt.starts_with("2023-11-1"), "got: {dt}");
}
