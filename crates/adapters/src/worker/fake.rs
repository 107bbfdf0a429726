// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake worker adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{WorkerAdapter, WorkerError, WorkerEvent, WorkerHandle, WorkerSpawnConfig};
use async_trait::async_trait;
use cw_core::{JobId, OutputStream, WorkerExit};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Recorded call to FakeWorkerAdapter
#[derive(Debug, Clone)]
pub enum WorkerCall {
    Launch { config: WorkerSpawnConfig },
    Terminate { job_id: JobId, pid: Option<u32> },
}

/// What a fake worker does when asked to terminate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminateBehavior {
    /// Exit immediately with the given status
    Exit(WorkerExit),
    /// Accept the request but keep running
    Ignore,
}

/// One step of a scripted worker run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeStep {
    Stdout(String),
    Stderr(String),
    Exit(WorkerExit),
}

/// Fake worker adapter for testing
///
/// Workers never run. Tests drive output and exits by hand, or script the
/// next launch up front.
#[derive(Clone)]
pub struct FakeWorkerAdapter {
    inner: Arc<Mutex<FakeWorkerState>>,
}

struct FakeWorkerState {
    workers: HashMap<JobId, mpsc::Sender<WorkerEvent>>,
    calls: Vec<WorkerCall>,
    spawn_error: Option<WorkerError>,
    terminate_error: Option<WorkerError>,
    terminate_behavior: TerminateBehavior,
    script: Option<Vec<FakeStep>>,
    last_job_id: Option<JobId>,
    next_pid: u32,
}

impl Default for FakeWorkerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeWorkerAdapter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeWorkerState {
                workers: HashMap::new(),
                calls: Vec::new(),
                spawn_error: None,
                terminate_error: None,
                terminate_behavior: TerminateBehavior::Exit(WorkerExit::Signal {
                    signal: Some(15),
                }),
                script: None,
                last_job_id: None,
                next_pid: 4242,
            })),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<WorkerCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of launch calls, failed ones included
    pub fn launch_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, WorkerCall::Launch { .. }))
            .count()
    }

    /// Make the next launch fail with a spawn error
    pub fn fail_next_spawn(&self, message: &str) {
        self.inner.lock().spawn_error = Some(WorkerError::SpawnFailed(message.to_string()));
    }

    /// Make the next terminate fail
    pub fn fail_terminate(&self, message: &str) {
        self.inner.lock().terminate_error =
            Some(WorkerError::TerminateFailed(message.to_string()));
    }

    pub fn set_terminate_behavior(&self, behavior: TerminateBehavior) {
        self.inner.lock().terminate_behavior = behavior;
    }

    /// Play these steps in order right after the next launch
    pub fn script_next_launch(&self, steps: Vec<FakeStep>) {
        self.inner.lock().script = Some(steps);
    }

    /// Job id of the most recent successful launch
    pub fn last_job_id(&self) -> Option<JobId> {
        self.inner.lock().last_job_id.clone()
    }

    /// Whether the worker for `job_id` has been launched and not yet exited
    pub fn is_live(&self, job_id: &JobId) -> bool {
        self.inner.lock().workers.contains_key(job_id)
    }

    /// Emit a stdout chunk for a live worker
    pub async fn emit_stdout(&self, job_id: &JobId, text: &str) {
        self.emit(job_id, OutputStream::Stdout, text).await;
    }

    /// Emit a stderr chunk for a live worker
    pub async fn emit_stderr(&self, job_id: &JobId, text: &str) {
        self.emit(job_id, OutputStream::Stderr, text).await;
    }

    /// End a live worker with the given exit status
    pub async fn exit(&self, job_id: &JobId, exit: WorkerExit) {
        let tx = self.inner.lock().workers.remove(job_id);
        if let Some(tx) = tx {
            let _ = tx
                .send(WorkerEvent::Exited {
                    job_id: job_id.clone(),
                    exit,
                })
                .await;
        }
    }

    async fn emit(&self, job_id: &JobId, stream: OutputStream, text: &str) {
        let tx = self.inner.lock().workers.get(job_id).cloned();
        if let Some(tx) = tx {
            let _ = tx
                .send(WorkerEvent::Output {
                    job_id: job_id.clone(),
                    stream,
                    chunk: text.as_bytes().to_vec(),
                })
                .await;
        }
    }
}

#[async_trait]
impl WorkerAdapter for FakeWorkerAdapter {
    async fn launch(
        &self,
        config: WorkerSpawnConfig,
        event_tx: mpsc::Sender<WorkerEvent>,
    ) -> Result<WorkerHandle, WorkerError> {
        let (handle, script) = {
            let mut inner = self.inner.lock();
            inner.calls.push(WorkerCall::Launch {
                config: config.clone(),
            });
            if let Some(error) = inner.spawn_error.take() {
                return Err(error);
            }
            let pid = inner.next_pid;
            inner.next_pid += 1;
            inner.workers.insert(config.job_id.clone(), event_tx);
            inner.last_job_id = Some(config.job_id.clone());
            (
                WorkerHandle {
                    job_id: config.job_id,
                    pid: Some(pid),
                },
                inner.script.take(),
            )
        };

        if let Some(steps) = script {
            let adapter = self.clone();
            let job_id = handle.job_id.clone();
            tokio::spawn(async move {
                for step in steps {
                    match step {
                        FakeStep::Stdout(text) => adapter.emit_stdout(&job_id, &text).await,
                        FakeStep::Stderr(text) => adapter.emit_stderr(&job_id, &text).await,
                        FakeStep::Exit(exit) => {
                            adapter.exit(&job_id, exit).await;
                            break;
                        }
                    }
                }
            });
        }

        Ok(handle)
    }

    async fn terminate(&self, handle: &WorkerHandle) -> Result<(), WorkerError> {
        let behavior = {
            let mut inner = self.inner.lock();
            inner.calls.push(WorkerCall::Terminate {
                job_id: handle.job_id.clone(),
                pid: handle.pid,
            });
            if let Some(error) = inner.terminate_error.take() {
                return Err(error);
            }
            if !inner.workers.contains_key(&handle.job_id) {
                return Err(WorkerError::NotRunning(handle.job_id.to_string()));
            }
            inner.terminate_behavior.clone()
        };

        if let TerminateBehavior::Exit(exit) = behavior {
            self.exit(&handle.job_id, exit).await;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
