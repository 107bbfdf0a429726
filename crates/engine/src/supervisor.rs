// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crawl job supervisor
//!
//! Owns the single job record and the handle of the worker running it.
//! Start, stop and clear serialize on a control lock so a stop never races an
//! in-flight launch. Status only takes the record lock.

use crate::error::SupervisorError;
use crate::pump::{apply_event, Applied};
use cw_adapters::{WorkerAdapter, WorkerEvent, WorkerHandle, WorkerSpawnConfig};
use cw_core::{
    Clock, IdGen, JobId, JobOutcome, JobRecord, JobSnapshot, JobStatus, LogBuffer, LogIngestor,
    OutputRules, WorkerExit, MAX_CATEGORY_BYTES, MAX_LOG_LINES,
};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Worker event channel depth. Readers wait when the pump falls behind.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Fixed worker invocation and output rules.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub rules: OutputRules,
    /// Maximum retained log entries
    pub log_capacity: usize,
}

impl SupervisorConfig {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
            env: Vec::new(),
            rules: OutputRules::default(),
            log_capacity: MAX_LOG_LINES,
        }
    }
}

/// Parameters of a start request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartRequest {
    pub target_count: u32,
    pub category_filter: Option<String>,
}

/// A start request that was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartAccepted {
    pub job_id: JobId,
    /// Target after clamping
    pub target_count: u32,
}

struct State {
    record: JobRecord,
    handle: Option<WorkerHandle>,
}

struct Inner<W, C, G> {
    worker: W,
    clock: C,
    ids: G,
    config: SupervisorConfig,
    state: Mutex<State>,
    control: tokio::sync::Mutex<()>,
    status_tx: watch::Sender<JobStatus>,
}

/// Supervisor for the external crawl worker.
///
/// Cheap to clone; clones share the same job.
pub struct Supervisor<W, C, G> {
    inner: Arc<Inner<W, C, G>>,
}

impl<W, C, G> Clone for Supervisor<W, C, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W, C, G> Supervisor<W, C, G>
where
    W: WorkerAdapter,
    C: Clock,
    G: IdGen,
{
    pub fn new(worker: W, clock: C, ids: G, config: SupervisorConfig) -> Self {
        let record = JobRecord {
            logs: LogBuffer::new(config.log_capacity),
            ..JobRecord::default()
        };
        let (status_tx, _) = watch::channel(JobStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                worker,
                clock,
                ids,
                config,
                state: Mutex::new(State {
                    record,
                    handle: None,
                }),
                control: tokio::sync::Mutex::new(()),
                status_tx,
            }),
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.config
    }

    /// Start a new job.
    ///
    /// Returns as soon as the worker is launched. A launch failure is not an
    /// error here: the job is recorded as failed and shows up in `status()`.
    pub async fn start(&self, request: StartRequest) -> Result<StartAccepted, SupervisorError> {
        let _control = self.inner.control.lock().await;
        let now = self.inner.clock.epoch_ms();
        let target_count = request.target_count.max(1);
        if request
            .category_filter
            .as_ref()
            .is_some_and(|c| c.len() > MAX_CATEGORY_BYTES)
        {
            return Err(SupervisorError::CategoryTooLong);
        }

        let (job_id, category_filter) = {
            let mut state = self.inner.state.lock();
            if state.record.status.is_active() {
                return Err(SupervisorError::AlreadyRunning);
            }
            let job_id = self.inner.ids.next();
            state
                .record
                .begin(job_id.clone(), target_count, request.category_filter, now);
            let filter = state.record.category_filter.clone();
            let line = match &filter {
                Some(c) => format!(
                    "crawl started: target {} item(s), category '{}'",
                    target_count, c
                ),
                None => format!("crawl started: target {} item(s)", target_count),
            };
            state.record.log(now, &line);
            state.handle = None;
            (job_id, filter)
        };
        self.publish(JobStatus::Running);
        tracing::info!(
            %job_id,
            target_count,
            category = category_filter.as_deref().unwrap_or(""),
            "crawl started"
        );

        let spawn_config = WorkerSpawnConfig {
            job_id: job_id.clone(),
            program: self.inner.config.program.clone(),
            args: self.inner.config.args.clone(),
            cwd: self.inner.config.cwd.clone(),
            env: self.inner.config.env.clone(),
            target_count,
            category_filter,
        };
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        match self.inner.worker.launch(spawn_config, event_tx).await {
            Ok(handle) => {
                {
                    let mut state = self.inner.state.lock();
                    if state.record.is_current(&job_id) && state.record.status.is_active() {
                        state.handle = Some(handle);
                    }
                }
                let ingestor = LogIngestor::new(self.inner.config.rules.clone());
                tokio::spawn(Self::pump(
                    Arc::clone(&self.inner),
                    job_id.clone(),
                    ingestor,
                    event_rx,
                ));
            }
            Err(e) => {
                tracing::error!(%job_id, error = %e, "worker launch failed");
                let now = self.inner.clock.epoch_ms();
                let status = {
                    let mut state = self.inner.state.lock();
                    state.handle = None;
                    state.record.finish(
                        JobOutcome::SpawnError {
                            message: e.to_string(),
                        },
                        now,
                    );
                    state.record.status
                };
                self.publish(status);
            }
        }

        Ok(StartAccepted {
            job_id,
            target_count,
        })
    }

    /// Ask the running worker to stop.
    ///
    /// The job stays `Stopping` until the worker actually exits.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        let _control = self.inner.control.lock().await;
        let now = self.inner.clock.epoch_ms();

        let handle = {
            let mut state = self.inner.state.lock();
            if state.record.status != JobStatus::Running {
                return Err(SupervisorError::NotRunning);
            }
            let Some(handle) = state.handle.clone() else {
                return Err(SupervisorError::NotRunning);
            };
            state.record.request_stop();
            state.record.log(now, "stop requested");
            handle
        };
        self.publish(JobStatus::Stopping);
        tracing::info!(job_id = %handle.job_id, "crawl stop requested");

        if let Err(e) = self.inner.worker.terminate(&handle).await {
            tracing::warn!(job_id = %handle.job_id, error = %e, "stop request not delivered");
            let now = self.inner.clock.epoch_ms();
            let mut state = self.inner.state.lock();
            if state.record.is_current(&handle.job_id) && state.record.status.is_active() {
                state
                    .record
                    .log_error(now, &format!("failed to deliver stop request: {}", e));
            }
        }
        Ok(())
    }

    /// Snapshot of the current job. Never waits on the worker.
    pub fn status(&self) -> JobSnapshot {
        self.inner.state.lock().record.snapshot()
    }

    /// Whether a worker handle is currently held.
    pub fn has_worker(&self) -> bool {
        self.inner.state.lock().handle.is_some()
    }

    /// Reset to a fresh idle record. Refused while a job is active.
    pub async fn clear_logs(&self) -> Result<(), SupervisorError> {
        let _control = self.inner.control.lock().await;
        {
            let mut state = self.inner.state.lock();
            if state.record.status.is_active() {
                return Err(SupervisorError::JobInProgress);
            }
            state.record.reset();
            state.handle = None;
        }
        self.publish(JobStatus::Idle);
        tracing::info!("crawl logs cleared");
        Ok(())
    }

    /// Wait until no job is active. Returns the final snapshot, or `None`
    /// if the job is still active after `timeout`.
    pub async fn wait_for_terminal(&self, timeout: Duration) -> Option<JobSnapshot> {
        let mut rx = self.inner.status_tx.subscribe();
        let settled = tokio::time::timeout(timeout, rx.wait_for(|s| !s.is_active()))
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false);
        settled.then(|| self.status())
    }

    /// Stop any running job and wait up to `timeout` for the worker to exit.
    pub async fn shutdown(&self, timeout: Duration) -> JobSnapshot {
        match self.stop().await {
            Ok(()) => tracing::info!("stopping crawl for shutdown"),
            Err(SupervisorError::NotRunning) => {}
            Err(e) => tracing::warn!(error = %e, "shutdown stop failed"),
        }
        if self.status().is_running && self.wait_for_terminal(timeout).await.is_none() {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "worker still running at shutdown"
            );
        }
        self.status()
    }

    fn publish(&self, status: JobStatus) {
        self.inner.status_tx.send_replace(status);
    }

    /// Apply worker events for `job_id` until its exit is recorded.
    async fn pump(
        inner: Arc<Inner<W, C, G>>,
        job_id: JobId,
        mut ingestor: LogIngestor,
        mut events: mpsc::Receiver<WorkerEvent>,
    ) {
        while let Some(event) = events.recv().await {
            let now = inner.clock.epoch_ms();
            let applied = {
                let mut state = inner.state.lock();
                let applied = apply_event(&mut state.record, &mut ingestor, &job_id, event, now);
                if let Applied::Finished(_) = applied {
                    state.handle = None;
                }
                applied
            };
            match applied {
                Applied::Finished(status) => {
                    inner.status_tx.send_replace(status);
                    tracing::info!(%job_id, %status, "crawl finished");
                    return;
                }
                Applied::Ignored => tracing::debug!(%job_id, "ignored stale worker event"),
                Applied::Output(_) => {}
            }
        }

        // Channel closed without an exit report.
        let now = inner.clock.epoch_ms();
        let status = {
            let mut state = inner.state.lock();
            if !state.record.is_current(&job_id) || !state.record.status.is_active() {
                return;
            }
            ingestor.finish(&mut state.record, now);
            state.handle = None;
            let stop_requested = state.record.stop_requested;
            state.record.finish(
                JobOutcome::from_exit(WorkerExit::Signal { signal: None }, stop_requested),
                now,
            );
            state.record.status
        };
        tracing::warn!(%job_id, "worker event stream closed without exit report");
        inner.status_tx.send_replace(status);
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
