// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `cwd` process as seen from the CLI: where its files live, how it is
//! launched and how it is taken down.

use crate::client::ClientError;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Marker the daemon writes to its log before anything else on startup.
const STARTUP_MARKER_PREFIX: &str = "--- cwd: starting (pid: ";

/// Files the daemon keeps under `CW_STATE_DIR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    pub fn locate() -> Result<Self, ClientError> {
        Ok(Self::at(crate::env::state_dir()?))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn socket(&self) -> PathBuf {
        self.root.join("daemon.sock")
    }

    pub fn pid_file(&self) -> PathBuf {
        self.root.join("daemon.pid")
    }

    pub fn log(&self) -> PathBuf {
        self.root.join("daemon.log")
    }

    pub fn version_file(&self) -> PathBuf {
        self.root.join("daemon.version")
    }

    pub fn cli_log(&self) -> PathBuf {
        self.root.join("cli.log")
    }

    /// Pid recorded by the daemon, if the file exists and parses.
    pub fn pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.pid_file())
            .ok()
            .and_then(|content| content.trim().parse().ok())
    }

    /// Recorded pid, but only while that process is alive.
    pub fn live_pid(&self) -> Option<u32> {
        self.pid().filter(|pid| process_exists(*pid))
    }

    /// Version string the running daemon was built with.
    pub fn daemon_version(&self) -> Option<String> {
        std::fs::read_to_string(self.version_file())
            .ok()
            .map(|v| v.trim().to_string())
    }

    /// Remove the socket and pid file when no live daemon owns them.
    pub fn clear_stale(&self) {
        if self.live_pid().is_none() {
            self.clear();
        }
    }

    /// Remove the socket and pid file unconditionally.
    pub fn clear(&self) {
        let _ = std::fs::remove_file(self.socket());
        let _ = std::fs::remove_file(self.pid_file());
    }

    /// Errors the daemon logged since its most recent startup marker.
    pub fn startup_error(&self) -> Option<String> {
        let content = std::fs::read_to_string(self.log()).ok()?;
        parse_startup_error(&content)
    }
}

fn parse_startup_error(content: &str) -> Option<String> {
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let errors: Vec<&str> = content[start_pos..]
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();
    if errors.is_empty() {
        return None;
    }

    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg))
        .collect();
    if messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(messages.join("\n"))
    }
}

/// Replace a connect/start error with what the daemon logged, if anything.
pub fn with_startup_error(err: ClientError) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }
    match StateDir::locate().ok().and_then(|s| s.startup_error()) {
        Some(logged) => ClientError::DaemonStartFailed(logged),
        None => err,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    /// Signal 0: existence check only.
    Exists,
    Term,
    Kill,
}

impl Signal {
    fn flag(self) -> &'static str {
        match self {
            Signal::Exists => "-0",
            Signal::Term => "-15",
            Signal::Kill => "-9",
        }
    }
}

fn send_signal(pid: u32, signal: Signal) -> bool {
    Command::new("kill")
        .args([signal.flag(), &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn process_exists(pid: u32) -> bool {
    send_signal(pid, Signal::Exists)
}

pub fn force_kill(pid: u32) -> bool {
    send_signal(pid, Signal::Kill)
}

/// Whether something is accepting connections on the daemon socket.
pub fn socket_accepts(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Find the cwd binary: CW_DAEMON_BINARY, dev build, sibling of `cw`, then PATH
pub fn find_cwd_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    let current_exe = std::env::current_exe().ok();

    // Only trust CARGO_MANIFEST_DIR when the CLI itself is a debug build
    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .is_some_and(|s| s.contains("target/debug"));
    if is_debug_build {
        let dev_path = crate::env::cargo_manifest_dir().and_then(|dir| {
            PathBuf::from(dir)
                .ancestors()
                .nth(2)
                .map(|ws| ws.join("target/debug/cwd"))
        });
        if let Some(path) = dev_path.filter(|p| p.exists()) {
            return path;
        }
    }

    current_exe
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join("cwd"))
        .filter(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from("cwd"))
}

/// Launch the daemon detached from this terminal.
pub fn launch_daemon() -> Result<Child, ClientError> {
    let cwd_path = find_cwd_binary();
    Command::new(&cwd_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {}", cwd_path.display(), e)))
}

/// Poll until `pid` is gone. Returns false if it outlived `timeout`.
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(crate::env::connect_poll()).await;
    }
    !process_exists(pid)
}

/// SIGTERM the recorded daemon, escalating to SIGKILL, from blocking code.
///
/// Used when a version mismatch forces a restart before any client exists.
pub fn stop_blocking(state: &StateDir) {
    let exited = |pid: u32| {
        let start = Instant::now();
        while start.elapsed() < crate::env::timeout_exit() {
            if !process_exists(pid) {
                return true;
            }
            std::thread::sleep(crate::env::connect_poll());
        }
        !process_exists(pid)
    };

    if let Some(pid) = state.live_pid() {
        send_signal(pid, Signal::Term);
        if !exited(pid) {
            force_kill(pid);
            exited(pid);
        }
    }
    state.clear_stale();
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
