// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS process worker adapter

use super::{WorkerAdapter, WorkerError, WorkerEvent, WorkerHandle, WorkerSpawnConfig};
use crate::subprocess::{run_with_timeout, terminate_command};
use async_trait::async_trait;
use cw_core::{JobId, OutputStream, WorkerExit};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const READ_CHUNK: usize = 8 * 1024;

/// Longest the waiter sleeps between exit checks when no SIGCHLD arrives.
const EXIT_POLL: Duration = Duration::from_millis(250);

/// Pid of a live worker. Cleared while locked, in the same step that reaps
/// the process, so a signal sent under the lock never reaches a reused pid.
type PidSlot = Arc<tokio::sync::Mutex<Option<u32>>>;

/// Launches the worker as a child process with piped stdout/stderr.
#[derive(Clone)]
pub struct ProcessWorkerAdapter {
    terminate_timeout: Duration,
    drain_grace: Duration,
    live: Arc<Mutex<HashMap<JobId, PidSlot>>>,
}

impl Default for ProcessWorkerAdapter {
    fn default() -> Self {
        Self {
            terminate_timeout: crate::env::terminate_timeout(),
            drain_grace: crate::env::drain_grace(),
            live: Arc::default(),
        }
    }
}

impl ProcessWorkerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    pub fn with_terminate_timeout(mut self, timeout: Duration) -> Self {
        self.terminate_timeout = timeout;
        self
    }
}

#[async_trait]
impl WorkerAdapter for ProcessWorkerAdapter {
    async fn launch(
        &self,
        config: WorkerSpawnConfig,
        event_tx: mpsc::Sender<WorkerEvent>,
    ) -> Result<WorkerHandle, WorkerError> {
        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args)
            .envs(config.invocation_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &config.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            WorkerError::SpawnFailed(format!("{}: {}", config.program.display(), e))
        })?;
        let pid = child.id();
        let job_id = config.job_id;

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(
                stdout,
                OutputStream::Stdout,
                job_id.clone(),
                event_tx.clone(),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(
                stderr,
                OutputStream::Stderr,
                job_id.clone(),
                event_tx.clone(),
            ));
        }

        let slot: PidSlot = Arc::new(tokio::sync::Mutex::new(pid));
        self.live.lock().insert(job_id.clone(), slot.clone());

        let drain_grace = self.drain_grace;
        let live = self.live.clone();
        let exit_job_id = job_id.clone();
        tokio::spawn(async move {
            let exit = reap(&mut child, &slot, &exit_job_id).await;
            live.lock().remove(&exit_job_id);

            // Output written before exit must land before the exit report.
            let drained = tokio::time::timeout(drain_grace, async {
                for reader in readers.iter_mut() {
                    let _ = reader.await;
                }
            })
            .await;
            if drained.is_err() {
                tracing::warn!(
                    job_id = %exit_job_id,
                    "worker output still open after exit, abandoning readers"
                );
                for reader in &readers {
                    reader.abort();
                }
            }

            let _ = event_tx
                .send(WorkerEvent::Exited {
                    job_id: exit_job_id,
                    exit,
                })
                .await;
        });

        Ok(WorkerHandle { job_id, pid })
    }

    /// A worker that already exited is not signalled again; its exit
    /// report is on the way.
    async fn terminate(&self, handle: &WorkerHandle) -> Result<(), WorkerError> {
        if handle.pid.is_none() {
            return Err(WorkerError::NotRunning(handle.job_id.to_string()));
        }
        let Some(slot) = self.live.lock().get(&handle.job_id).cloned() else {
            tracing::debug!(job_id = %handle.job_id, "worker already exited, nothing to terminate");
            return Ok(());
        };
        // Held until the signal is sent so the waiter cannot reap in between.
        let live_pid = slot.lock().await;
        let Some(pid) = *live_pid else {
            return Ok(());
        };

        let output = run_with_timeout(
            terminate_command(pid),
            self.terminate_timeout,
            "terminate worker",
        )
        .await
        .map_err(WorkerError::TerminateFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorkerError::TerminateFailed(format!(
                "pid {}: {}",
                pid,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Wait for the child to exit and reap it, clearing `slot` under its lock.
///
/// The check uses `try_wait` so reaping happens only while the slot is held;
/// SIGCHLD (or [`EXIT_POLL`]) paces the checks.
async fn reap(child: &mut Child, slot: &PidSlot, job_id: &JobId) -> WorkerExit {
    let mut child_signal = ChildSignal::new();
    loop {
        {
            let mut pid = slot.lock().await;
            match child.try_wait() {
                Ok(Some(status)) => {
                    *pid = None;
                    return exit_from_status(status);
                }
                Ok(None) => {}
                Err(e) => {
                    *pid = None;
                    tracing::warn!(%job_id, error = %e, "failed to wait on worker");
                    return WorkerExit::Signal { signal: None };
                }
            }
        }
        child_signal.next().await;
    }
}

/// Wakes the waiter when a child process changes state.
struct ChildSignal {
    #[cfg(unix)]
    inner: Option<tokio::signal::unix::Signal>,
}

impl ChildSignal {
    fn new() -> Self {
        Self {
            #[cfg(unix)]
            inner: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::child()).ok(),
        }
    }

    async fn next(&mut self) {
        #[cfg(unix)]
        if let Some(signal) = self.inner.as_mut() {
            let _ = tokio::time::timeout(EXIT_POLL, signal.recv()).await;
            return;
        }
        tokio::time::sleep(EXIT_POLL).await;
    }
}

/// Forward raw chunks from one pipe until EOF or until nobody listens.
fn spawn_reader<R>(
    mut pipe: R,
    stream: OutputStream,
    job_id: JobId,
    event_tx: mpsc::Sender<WorkerEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match pipe.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let event = WorkerEvent::Output {
                        job_id: job_id.clone(),
                        stream,
                        chunk: buf[..n].to_vec(),
                    };
                    if event_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(%job_id, %stream, error = %e, "worker pipe read failed");
                    break;
                }
            }
        }
    })
}

fn exit_from_status(status: ExitStatus) -> WorkerExit {
    if let Some(code) = status.code() {
        return WorkerExit::Code { code };
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        WorkerExit::Signal {
            signal: status.signal(),
        }
    }
    #[cfg(not(unix))]
    {
        WorkerExit::Signal { signal: None }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
