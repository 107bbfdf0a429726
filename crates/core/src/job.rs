// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crawl job record and its state machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::id::JobId;
use crate::log_buffer::{format_entry, LogBuffer};
use crate::outcome::JobOutcome;

/// Longest category filter a job accepts, in bytes.
pub const MAX_CATEGORY_BYTES: usize = 256;

/// Lifecycle status of the current (or most recent) job.
///
/// ```text
/// Idle ──start──▶ Running ──exit──▶ Completed | Failed
///                    │
///                   stop
///                    ▼
///                 Stopping ──exit──▶ Completed | Failed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Stopping,
    Completed,
    Failed,
}

impl JobStatus {
    /// A worker is (or is about to be) alive.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Running | JobStatus::Stopping)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Idle => write!(f, "idle"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Stopping => write!(f, "stopping"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Mutable state of the supervisor's single job.
///
/// Owned by the supervisor behind one lock; everything else sees it through
/// [`JobSnapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRecord {
    pub job_id: Option<JobId>,
    pub status: JobStatus,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
    /// Requested item goal for this job.
    pub target_count: u32,
    /// Opaque filter token passed through to the worker.
    pub category_filter: Option<String>,
    /// Lines recognized as "one item saved".
    pub saved_count: u64,
    pub logs: LogBuffer,
    /// Supplementary counters derived from the worker's output vocabulary.
    pub metrics: BTreeMap<String, u64>,
    pub outcome: Option<JobOutcome>,
    pub stop_requested: bool,
}

impl JobRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-initialize for a new job and mark it running.
    pub fn begin(
        &mut self,
        job_id: JobId,
        target_count: u32,
        category_filter: Option<String>,
        now_ms: u64,
    ) {
        let capacity = self.logs.capacity();
        *self = JobRecord {
            job_id: Some(job_id),
            status: JobStatus::Running,
            started_at_ms: Some(now_ms),
            target_count,
            category_filter: category_filter.filter(|c| !c.trim().is_empty()),
            logs: LogBuffer::new(capacity),
            ..JobRecord::default()
        };
    }

    /// Whether `job_id` refers to the job this record currently describes.
    pub fn is_current(&self, job_id: &JobId) -> bool {
        self.job_id.as_ref() == Some(job_id)
    }

    /// Append a timestamped informational entry.
    pub fn log(&mut self, now_ms: u64, text: &str) {
        self.logs.push(format_entry(now_ms, false, text));
    }

    /// Append a timestamped `[ERROR]` entry.
    pub fn log_error(&mut self, now_ms: u64, text: &str) {
        self.logs.push(format_entry(now_ms, true, text));
    }

    pub fn bump_metric(&mut self, key: &str, by: u64) {
        *self.metrics.entry(key.to_string()).or_insert(0) += by;
    }

    pub fn set_metric(&mut self, key: &str, value: u64) {
        self.metrics.insert(key.to_string(), value);
    }

    /// Running → Stopping. Returns false if the job was not running.
    pub fn request_stop(&mut self) -> bool {
        if self.status != JobStatus::Running {
            return false;
        }
        self.status = JobStatus::Stopping;
        self.stop_requested = true;
        true
    }

    /// Record the terminal outcome. No-op (returns false) if the job already
    /// reached a terminal state, so late exit reports cannot rewrite history.
    pub fn finish(&mut self, outcome: JobOutcome, now_ms: u64) -> bool {
        if !self.status.is_active() {
            return false;
        }
        let summary = outcome.summary(self.saved_count);
        if outcome.is_failure() {
            self.log_error(now_ms, &summary);
        } else {
            self.log(now_ms, &summary);
        }
        self.status = outcome.status();
        self.ended_at_ms = Some(now_ms);
        self.outcome = Some(outcome);
        true
    }

    /// Back to a fresh idle record (empty buffer, zero counters, no timestamps).
    pub fn reset(&mut self) {
        let capacity = self.logs.capacity();
        *self = JobRecord {
            logs: LogBuffer::new(capacity),
            ..JobRecord::default()
        };
    }

    /// Completion percentage of `saved_count` against `target_count`, capped at 100.
    pub fn progress_percent(&self) -> u8 {
        if self.target_count == 0 {
            return 0;
        }
        let pct = (self.saved_count as f64 / self.target_count as f64 * 100.0).round();
        pct.min(100.0) as u8
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.job_id.clone(),
            status: self.status,
            is_running: self.status.is_active(),
            started_at_ms: self.started_at_ms,
            ended_at_ms: self.ended_at_ms,
            target_count: self.target_count,
            category_filter: self.category_filter.clone(),
            saved_count: self.saved_count,
            progress_percent: self.progress_percent(),
            logs: self.logs.to_vec(),
            dropped_lines: self.logs.dropped(),
            metrics: self.metrics.clone(),
            outcome: self.outcome.clone(),
        }
    }
}

/// Read-only copy of a [`JobRecord`] handed to status callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub status: JobStatus,
    pub is_running: bool,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
    pub target_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_filter: Option<String>,
    pub saved_count: u64,
    pub progress_percent: u8,
    pub logs: Vec<String>,
    #[serde(default)]
    pub dropped_lines: u64,
    #[serde(default)]
    pub metrics: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<JobOutcome>,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
