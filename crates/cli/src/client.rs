// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::client_lifecycle::log_connection_error;
use crate::daemon_process::{
    launch_daemon, socket_accepts, stop_blocking, with_startup_error, StateDir,
};
use crate::env::{connect_poll, timeout_connect, timeout_exit, timeout_ipc};

use cw_core::{JobSnapshot, JobStatus};
use cw_daemon::protocol::{self, ProtocolError};
use cw_daemon::{Request, Response, PROTOCOL_VERSION};
use thiserror::Error;
use tokio::net::UnixStream;

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{message}")]
    Rejected { code: String, message: String },

    #[error("Daemon error: {0}")]
    Daemon(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,
}

impl ClientError {
    /// Socket file present but nobody listening, or no socket at all.
    pub fn is_not_running(&self) -> bool {
        match self {
            ClientError::DaemonNotRunning => true,
            ClientError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}

/// Daemon status as reported by `Request::Status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub pid: u32,
    pub crawl: JobStatus,
}

/// Accepted crawl start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStarted {
    pub job_id: String,
    pub target_count: u32,
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For action commands - auto-start with version check, max 1 restart per process
    pub fn for_action() -> Result<Self, ClientError> {
        Self::connect_or_start_once()
    }

    /// For query commands - connect only, no restart
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    fn connect_or_start_once() -> Result<Self, ClientError> {
        static RESTARTED: AtomicBool = AtomicBool::new(false);

        if RESTARTED.load(Ordering::SeqCst) {
            return Self::connect();
        }

        let state = StateDir::locate()?;
        if let Some(daemon_version) = state.daemon_version() {
            if daemon_version != PROTOCOL_VERSION {
                RESTARTED.store(true, Ordering::SeqCst);
                eprintln!(
                    "warn: daemon version {} does not match cli version {}, restarting daemon",
                    daemon_version, PROTOCOL_VERSION
                );
                stop_blocking(&state);
            }
        }

        Self::connect_or_start()
    }

    /// Connect to daemon, auto-starting if not running
    pub fn connect_or_start() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                // Daemon may have crashed, leaving a stale socket file
                if socket_accepts(&client.socket_path) {
                    Ok(client)
                } else {
                    StateDir::locate()?.clear_stale();
                    let child = launch_daemon()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = launch_daemon()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(with_startup_error(e)),
        }
    }

    /// Connect to existing daemon (no auto-start)
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = StateDir::locate()?.socket();

        if !socket_path.exists() {
            let err = ClientError::DaemonNotRunning;
            log_connection_error(&err);
            return Err(err);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            // Early exit means startup failed; the reason is in daemon.log
            if let Ok(Some(status)) = child.try_wait() {
                let state = StateDir::locate()?;
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_exit() {
                    if let Some(err) = state.startup_error() {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    std::thread::sleep(connect_poll());
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "exited with {}",
                    status
                )));
            }

            match Self::connect() {
                Ok(client) if socket_accepts(&client.socket_path) => return Ok(client),
                Ok(_) | Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(connect_poll());
                }
                Err(e) => return Err(with_startup_error(e)),
            }
        }

        Err(with_startup_error(ClientError::DaemonStartTimeout))
    }

    async fn send_with_timeout(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        protocol::write_request(&mut writer, request, timeout).await?;
        Ok(protocol::read_response(&mut reader, timeout).await?)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        match self.send_with_timeout(request, timeout_ipc()).await {
            Ok(response) => Ok(response),
            Err(e) => {
                log_connection_error(&e);
                Err(e)
            }
        }
    }

    async fn send_simple(&self, request: &Request) -> Result<(), ClientError> {
        check_ok(self.send(request).await?)
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: PROTOCOL_VERSION.to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    /// Get daemon status
    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(&Request::Status).await? {
            Response::DaemonStatus {
                uptime_secs,
                pid,
                crawl,
            } => Ok(DaemonStatus {
                uptime_secs,
                pid,
                crawl,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Start a crawl job
    pub async fn crawl_start(
        &self,
        target_count: u32,
        category_filter: Option<String>,
    ) -> Result<CrawlStarted, ClientError> {
        let request = Request::CrawlStart {
            target_count,
            category_filter,
        };
        match self.send(&request).await? {
            Response::CrawlStarted {
                job_id,
                target_count,
            } => Ok(CrawlStarted {
                job_id,
                target_count,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Ask the running crawl to stop
    pub async fn crawl_stop(&self) -> Result<(), ClientError> {
        self.send_simple(&Request::CrawlStop).await
    }

    /// Snapshot of the current crawl job
    pub async fn crawl_status(&self) -> Result<JobSnapshot, ClientError> {
        match self.send(&Request::CrawlStatus).await? {
            Response::Status { job } => Ok(*job),
            other => Err(unexpected(other)),
        }
    }

    /// Clear the crawl log
    pub async fn crawl_clear(&self) -> Result<(), ClientError> {
        self.send_simple(&Request::CrawlClearLogs).await
    }
}

fn check_ok(response: Response) -> Result<(), ClientError> {
    match response {
        Response::Ok => Ok(()),
        other => Err(unexpected(other)),
    }
}

/// Map a response the caller did not ask for into an error.
fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Rejected { code, message } => ClientError::Rejected { code, message },
        Response::Error { message } => ClientError::Daemon(message),
        _ => ClientError::UnexpectedResponse,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
