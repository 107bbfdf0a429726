// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle and diagnostic logging for the CLI client.

use crate::client::{ClientError, DaemonClient};
use crate::daemon_process::{force_kill, process_exists, wait_for_exit, StateDir};
use crate::env::timeout_exit;

/// Stop the daemon (graceful first, then forceful).
/// Returns true if the daemon was stopped, false if it wasn't running.
///
/// A graceful shutdown also stops a running crawl; the daemon waits for the
/// worker to exit before it goes away.
pub async fn daemon_stop() -> Result<bool, ClientError> {
    let state = StateDir::locate()?;
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            state.clear_stale();
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let shutdown_result = client.shutdown().await;
    if let Err(ref e) = shutdown_result {
        if e.is_not_running() && state.pid().is_none() {
            return Ok(false);
        }
    }

    if let Some(pid) = state.pid() {
        if shutdown_result.is_ok() {
            wait_for_exit(pid, timeout_exit()).await;
        }
        if process_exists(pid) {
            force_kill(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    state.clear();
    Ok(true)
}

/// Write a diagnostic message to `<state_dir>/cli.log`.
fn write_cli_log(message: String) {
    use std::io::Write;
    use std::time::SystemTime;

    let Ok(state) = StateDir::locate() else {
        return;
    };
    if std::fs::create_dir_all(state.root()).is_err() {
        return;
    }

    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(state.cli_log())
    {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let state_dir = crate::env::state_dir_raw().unwrap_or_else(|| "(not set)".to_string());
        let _ = writeln!(
            file,
            "[ts={}] pid={} CW_STATE_DIR={} {}",
            timestamp,
            std::process::id(),
            state_dir,
            message
        );
    }
}

/// Log a connection error for debugging.
///
/// Writes to `<state_dir>/cli.log` so failures in scripted callers, whose
/// stderr may be discarded, can still be diagnosed.
pub fn log_connection_error(error: &ClientError) {
    let socket_path = StateDir::locate()
        .map(|s| s.socket().display().to_string())
        .unwrap_or_else(|_| "(unknown)".to_string());
    write_cli_log(format!("socket={} error={}", socket_path, error));
}
