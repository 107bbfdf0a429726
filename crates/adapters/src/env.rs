// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for the platform kill helper (default: 5000ms).
pub fn terminate_timeout() -> Duration {
    parse_duration_ms("CW_TERMINATE_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// How long to keep reading a worker's pipes after it exits (default: 2000ms).
///
/// Helpers forked by the worker can inherit its stdout and hold the pipe
/// open after the worker itself is gone.
pub fn drain_grace() -> Duration {
    parse_duration_ms("CW_DRAIN_GRACE_MS").unwrap_or(Duration::from_secs(2))
}
