// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Following a crawl job from the CLI (`cw crawl start --wait`).
//!
//! The daemon only answers status polls, so following means re-fetching the
//! snapshot on an interval and printing the log entries that appeared since
//! the previous poll.

use std::future::Future;
use std::time::{Duration, Instant};

use cw_core::JobSnapshot;

/// How a follow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowEnd {
    /// The job reached a terminal status.
    Finished(Box<JobSnapshot>),
    /// The deadline passed while the job was still active.
    TimedOut,
    /// Ctrl+C (or whatever interrupt future was supplied) fired.
    Interrupted,
    /// Another job took over the record; the followed one is gone.
    Replaced,
}

/// Position in a job's lifetime log stream.
///
/// Snapshots carry at most the retained tail plus a count of evicted
/// entries, so the cursor tracks the lifetime total rather than an index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogCursor {
    seen: u64,
}

impl LogCursor {
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Entries of `job` not seen yet. Entries evicted between polls are
    /// skipped.
    pub fn advance<'a>(&mut self, job: &'a JobSnapshot) -> &'a [String] {
        let first = job.dropped_lines;
        let retained = job.logs.len() as u64;
        let start = self.seen.saturating_sub(first).min(retained) as usize;
        self.seen = first + retained;
        &job.logs[start..]
    }
}

/// Polls one job until it ends, the deadline passes or the wait is
/// interrupted.
pub struct CrawlFollower {
    job_id: String,
    interval: Duration,
    deadline: Option<Instant>,
    cursor: LogCursor,
}

impl CrawlFollower {
    /// A timeout too large to represent is treated as no timeout.
    pub fn new(job_id: impl Into<String>, interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            job_id: job_id.into(),
            interval,
            deadline: timeout.and_then(|t| Instant::now().checked_add(t)),
            cursor: LogCursor::default(),
        }
    }

    pub fn has_deadline(&self) -> bool {
        self.deadline.is_some()
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Run the poll loop. `fetch` returns the current snapshot; `on_line`
    /// receives every new log entry exactly once.
    ///
    /// The job is always fetched before the deadline is checked, so a job
    /// that ended during the last interval is reported as finished.
    pub async fn run<F, Fut, E, I>(
        mut self,
        mut fetch: F,
        interrupt: I,
        mut on_line: impl FnMut(&str),
    ) -> Result<FollowEnd, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<JobSnapshot, E>>,
        I: Future,
    {
        tokio::pin!(interrupt);
        loop {
            let job = fetch().await?;
            if job.job_id.as_ref().map(|id| id.as_str()) != Some(self.job_id.as_str()) {
                return Ok(FollowEnd::Replaced);
            }
            for line in self.cursor.advance(&job) {
                on_line(line);
            }
            if !job.status.is_active() {
                return Ok(FollowEnd::Finished(Box::new(job)));
            }
            if self.expired() {
                return Ok(FollowEnd::TimedOut);
            }
            tokio::select! {
                _ = &mut interrupt => return Ok(FollowEnd::Interrupted),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

/// Resolves on Ctrl+C. If the handler cannot be installed it never resolves.
pub async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[path = "follow_tests.rs"]
mod tests;
