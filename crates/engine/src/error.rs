// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for supervisor operations

use thiserror::Error;

/// Caller misuse of the supervisor. Never mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SupervisorError {
    #[error("a crawl job is already running")]
    AlreadyRunning,
    #[error("no crawl job is running")]
    NotRunning,
    #[error("cannot clear logs while a crawl job is in progress")]
    JobInProgress,
    #[error("category filter is longer than {} bytes", cw_core::MAX_CATEGORY_BYTES)]
    CategoryTooLong,
}

impl SupervisorError {
    /// Stable machine-readable code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            SupervisorError::AlreadyRunning => "already_running",
            SupervisorError::NotRunning => "not_running",
            SupervisorError::JobInProgress => "job_in_progress",
            SupervisorError::CategoryTooLong => "category_too_long",
        }
    }
}
