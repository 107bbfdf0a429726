// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use cw_adapters::{ProcessWorkerAdapter, TracedWorker};
use cw_core::{SystemClock, UuidIdGen};
use cw_engine::Supervisor;
use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::config::FileConfig;
use crate::env::state_dir;

/// Supervisor with the concrete worker adapter (wrapped with tracing)
pub type DaemonSupervisor = Supervisor<TracedWorker<ProcessWorkerAdapter>, SystemClock, UuidIdGen>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/cw)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to worker configuration
    pub config_path: PathBuf,
    /// How long shutdown waits for a running worker to exit
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Load configuration for the user-level daemon.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::for_state_dir(state_dir()?))
    }

    pub fn for_state_dir(state_dir: PathBuf) -> Self {
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            config_path: state_dir.join("config.toml"),
            shutdown_timeout: crate::env::shutdown_timeout(),
            state_dir,
        }
    }
}

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // Held for its lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub supervisor: DaemonSupervisor,
    pub start_time: Instant,
}

/// Result of daemon startup
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

impl DaemonState {
    /// Stop any running crawl, then remove the daemon's files.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        let job = self.supervisor.shutdown(self.config.shutdown_timeout).await;
        if job.is_running {
            warn!(status = %job.status, "crawl worker may outlive the daemon");
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }
        if self.config.version_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.version_path) {
                warn!("Failed to remove version file: {}", e);
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Another daemon owns these files
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock before touching anything else; don't truncate until held
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Version file
    std::fs::write(&config.version_path, crate::protocol::PROTOCOL_VERSION)?;

    // 4. Worker configuration
    let settings = FileConfig::load(&config.config_path)?.worker_settings();
    let mut adapter = ProcessWorkerAdapter::new();
    if let Some(timeout) = settings.terminate_timeout {
        adapter = adapter.with_terminate_timeout(timeout);
    }
    info!(
        program = %settings.supervisor.program.display(),
        args = ?settings.supervisor.args,
        saved_marker = settings.supervisor.rules.saved_marker(),
        "worker configured"
    );
    let supervisor = Supervisor::new(
        TracedWorker::new(adapter),
        SystemClock,
        UuidIdGen,
        settings.supervisor,
    );

    // 5. Bind socket (remove stale socket from a crashed daemon)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(socket = %config.socket_path.display(), "daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            supervisor,
            start_time: Instant::now(),
        },
        listener,
    })
}

/// Remove files a failed startup may have left behind
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
