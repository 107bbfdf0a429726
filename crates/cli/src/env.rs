// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::client::ClientError;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

// --- State directory ---

/// Resolve state directory: CW_STATE_DIR > XDG_STATE_HOME/cw > ~/.local/state/cw
pub fn state_dir() -> Result<PathBuf, ClientError> {
    if let Ok(dir) = std::env::var("CW_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("cw"));
    }
    let home = std::env::var("HOME").map_err(|_| ClientError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/cw"))
}

/// Read CW_STATE_DIR raw (for diagnostic logging)
pub fn state_dir_raw() -> Option<String> {
    std::env::var("CW_STATE_DIR").ok()
}

// --- Color ---

pub fn no_color() -> bool {
    std::env::var("NO_COLOR").is_ok_and(|v| v == "1")
}

pub fn force_color() -> bool {
    std::env::var("COLOR").is_ok_and(|v| v == "1")
}

// --- Daemon binary ---

pub fn daemon_binary() -> Option<String> {
    std::env::var("CW_DAEMON_BINARY").ok()
}

pub fn cargo_manifest_dir() -> Option<String> {
    std::env::var("CARGO_MANIFEST_DIR").ok()
}

// --- Timeouts ---

/// Timeout for IPC requests
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("CW_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("CW_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon process to exit
pub fn timeout_exit() -> Duration {
    parse_duration_ms("CW_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(15))
}

/// Polling interval for connection retries
pub fn connect_poll() -> Duration {
    parse_duration_ms("CW_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}

/// Polling interval for `cw crawl start --wait`
pub fn wait_poll() -> Duration {
    parse_duration_ms("CW_POLL_MS").unwrap_or(Duration::from_secs(2))
}
