// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: CW_STATE_DIR > XDG_STATE_HOME/cw > ~/.local/state/cw
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("CW_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("cw"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/cw"))
}

/// Worker program override
pub fn worker_program() -> Option<PathBuf> {
    std::env::var("CW_WORKER_PROGRAM")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Worker argument override, split on whitespace. Set but empty means no args.
pub fn worker_args() -> Option<Vec<String>> {
    std::env::var("CW_WORKER_ARGS")
        .ok()
        .map(|s| s.split_whitespace().map(str::to_string).collect())
}

/// Saved-item marker override
pub fn saved_marker() -> Option<String> {
    std::env::var("CW_SAVED_MARKER")
        .ok()
        .filter(|s| !s.is_empty())
}

/// How long shutdown waits for a stopped worker to exit (default: 10s)
pub fn shutdown_timeout() -> Duration {
    std::env::var("CW_SHUTDOWN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}
