// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External crawl worker adapters
//!
//! A `WorkerAdapter` owns the lifecycle of the external data-collection
//! process. It launches the worker, forwards raw output chunks and exactly
//! one exit report over an event channel, and accepts termination requests.
//!
//! ```text
//! launch ──▶ Output* (stdout/stderr, arrival order) ──▶ Exited (once)
//! ```

mod process;

pub use process::ProcessWorkerAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStep, FakeWorkerAdapter, TerminateBehavior, WorkerCall};

use async_trait::async_trait;
use cw_core::{JobId, OutputStream, WorkerExit};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;

/// Env var carrying the requested item count to the worker.
pub const ENV_CRAWL_LIMIT: &str = "CRAWL_LIMIT";
/// Env var carrying the opaque category filter to the worker.
pub const ENV_CATEGORY_FILTER: &str = "CATEGORY_FILTER";
/// Env var that disables stdout buffering in Python workers.
pub const ENV_UNBUFFERED: &str = "PYTHONUNBUFFERED";

/// Errors from worker operations
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("terminate failed: {0}")]
    TerminateFailed(String),
    #[error("worker not running: {0}")]
    NotRunning(String),
}

/// Everything needed to launch one worker process.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSpawnConfig {
    /// Job the worker belongs to; stamped on every event
    pub job_id: JobId,
    /// Fixed executable path
    pub program: PathBuf,
    /// Fixed arguments (e.g. the crawler script path)
    pub args: Vec<String>,
    /// Working directory (inherits the daemon's when unset)
    pub cwd: Option<PathBuf>,
    /// Extra environment from configuration
    pub env: Vec<(String, String)>,
    /// Requested item count
    pub target_count: u32,
    /// Opaque category filter
    pub category_filter: Option<String>,
}

impl WorkerSpawnConfig {
    /// Environment passed to the worker: configured extras, then the job
    /// parameters. Values travel as plain data, never through a shell.
    pub fn invocation_env(&self) -> Vec<(String, String)> {
        let mut env = self.env.clone();
        env.push((ENV_CRAWL_LIMIT.to_string(), self.target_count.to_string()));
        env.push((
            ENV_CATEGORY_FILTER.to_string(),
            self.category_filter.clone().unwrap_or_default(),
        ));
        env.push((ENV_UNBUFFERED.to_string(), "1".to_string()));
        env
    }
}

/// Handle to a launched worker. Only the supervisor holds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerHandle {
    pub job_id: JobId,
    /// OS process id, when the platform reports one
    pub pid: Option<u32>,
}

/// Event reported by a running worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Raw output chunk; not aligned to line boundaries
    Output {
        job_id: JobId,
        stream: OutputStream,
        chunk: Vec<u8>,
    },
    /// Process ended. Sent once, after both output streams were drained.
    Exited { job_id: JobId, exit: WorkerExit },
}

impl WorkerEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            WorkerEvent::Output { job_id, .. } | WorkerEvent::Exited { job_id, .. } => job_id,
        }
    }
}

/// Adapter for launching and stopping the external worker
#[async_trait]
pub trait WorkerAdapter: Clone + Send + Sync + 'static {
    /// Launch the worker.
    ///
    /// Output chunks and the final exit report are delivered on `event_tx`.
    /// A spawn failure is returned here and no events are sent.
    async fn launch(
        &self,
        config: WorkerSpawnConfig,
        event_tx: mpsc::Sender<WorkerEvent>,
    ) -> Result<WorkerHandle, WorkerError>;

    /// Ask the worker to terminate.
    ///
    /// Returns once the request is delivered; the exit itself arrives later
    /// as [`WorkerEvent::Exited`].
    async fn terminate(&self, handle: &WorkerHandle) -> Result<(), WorkerError>;
}
