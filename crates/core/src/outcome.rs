// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! How a worker process ended, and what that means for the job.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::JobStatus;

/// Exit indicator reported once per launched worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerExit {
    /// Process exited on its own with a status code.
    Code { code: i32 },
    /// Process was terminated by a signal (number unavailable on some platforms).
    Signal { signal: Option<i32> },
}

impl WorkerExit {
    pub fn code(&self) -> Option<i32> {
        match self {
            WorkerExit::Code { code } => Some(*code),
            WorkerExit::Signal { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code() == Some(0)
    }
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerExit::Code { code } => write!(f, "exit code {}", code),
            WorkerExit::Signal { signal: Some(sig) } => write!(f, "signal {}", sig),
            WorkerExit::Signal { signal: None } => write!(f, "signal"),
        }
    }
}

/// Terminal result of a job, recorded into the job record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Worker exited with code 0.
    Succeeded,
    /// Worker exited (any way) after an operator stop request.
    RequestedTermination { exit: WorkerExit },
    /// Worker exited non-zero or was killed without a stop request.
    AbnormalExit { exit: WorkerExit },
    /// Worker could not be launched at all.
    SpawnError { message: String },
}

impl JobOutcome {
    /// Classify a process exit. Any exit after a stop request counts as an
    /// expected outcome, whatever the code.
    pub fn from_exit(exit: WorkerExit, stop_requested: bool) -> Self {
        if stop_requested {
            JobOutcome::RequestedTermination { exit }
        } else if exit.is_success() {
            JobOutcome::Succeeded
        } else {
            JobOutcome::AbnormalExit { exit }
        }
    }

    /// Terminal job status this outcome maps to.
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Succeeded | JobOutcome::RequestedTermination { .. } => {
                JobStatus::Completed
            }
            JobOutcome::AbnormalExit { .. } | JobOutcome::SpawnError { .. } => JobStatus::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status() == JobStatus::Failed
    }

    /// Final log line describing the outcome and the saved-item total.
    pub fn summary(&self, saved_count: u64) -> String {
        match self {
            JobOutcome::Succeeded => {
                format!("crawl completed: {} item(s) saved", saved_count)
            }
            JobOutcome::RequestedTermination { exit } => format!(
                "crawl stopped by request ({}): {} item(s) saved",
                exit, saved_count
            ),
            JobOutcome::AbnormalExit { exit } => format!(
                "crawl failed ({}): {} item(s) saved",
                exit, saved_count
            ),
            JobOutcome::SpawnError { message } => {
                format!("failed to launch worker: {}", message)
            }
        }
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
