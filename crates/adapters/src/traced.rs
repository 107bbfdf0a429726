// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::worker::{WorkerAdapter, WorkerError, WorkerEvent, WorkerHandle, WorkerSpawnConfig};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Wrapper that adds tracing to any WorkerAdapter
#[derive(Clone)]
pub struct TracedWorker<W> {
    inner: W,
}

impl<W> TracedWorker<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<W: WorkerAdapter> WorkerAdapter for TracedWorker<W> {
    async fn launch(
        &self,
        config: WorkerSpawnConfig,
        event_tx: mpsc::Sender<WorkerEvent>,
    ) -> Result<WorkerHandle, WorkerError> {
        let span = tracing::info_span!(
            "worker.launch",
            job_id = %config.job_id,
            program = %config.program.display(),
        );
        async {
            tracing::info!(
                target_count = config.target_count,
                category = config.category_filter.as_deref().unwrap_or(""),
                "starting"
            );
            let start = std::time::Instant::now();
            let result = self.inner.launch(config, event_tx).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(h) => tracing::info!(pid = ?h.pid, elapsed_ms, "worker launched"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "launch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn terminate(&self, handle: &WorkerHandle) -> Result<(), WorkerError> {
        let result = self.inner.terminate(handle).await;
        tracing::info_span!("worker.terminate", job_id = %handle.job_id, pid = ?handle.pid)
            .in_scope(|| match &result {
                Ok(()) => tracing::info!("termination requested"),
                Err(e) => tracing::warn!(error = %e, "terminate failed (may be expected)"),
            });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
