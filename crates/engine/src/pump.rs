// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applying worker events to the job record

use cw_adapters::WorkerEvent;
use cw_core::{JobId, JobOutcome, JobRecord, JobStatus, LogIngestor};

/// What applying one event did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applied {
    /// Output ingested; number of log entries appended
    Output(usize),
    /// Worker exit recorded; the job is now in this terminal status
    Finished(JobStatus),
    /// Event belongs to another job, or the job already ended
    Ignored,
}

/// Apply `event` from the worker launched for `job_id`.
///
/// The caller holds the record lock for the whole call.
pub(crate) fn apply_event(
    record: &mut JobRecord,
    ingestor: &mut LogIngestor,
    job_id: &JobId,
    event: WorkerEvent,
    now_ms: u64,
) -> Applied {
    if event.job_id() != job_id || !record.is_current(job_id) || !record.status.is_active() {
        return Applied::Ignored;
    }

    match event {
        WorkerEvent::Output { stream, chunk, .. } => {
            Applied::Output(ingestor.ingest(record, stream, &chunk, now_ms))
        }
        WorkerEvent::Exited { exit, .. } => {
            ingestor.finish(record, now_ms);
            let outcome = JobOutcome::from_exit(exit, record.stop_requested);
            record.finish(outcome, now_ms);
            Applied::Finished(record.status)
        }
    }
}

#[cfg(test)]
#[path = "pump_tests.rs"]
mod tests;
