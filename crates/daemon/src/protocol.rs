// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

use cw_core::{JobSnapshot, JobStatus};
use serde::{Deserialize, Serialize};

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    decode, encode, read_frame, read_request, read_response, write_frame, write_request,
    write_response, FrameKind, ProtocolError, DEFAULT_TIMEOUT, MAX_REQUEST_SIZE, MAX_RESPONSE_SIZE,
    PROTOCOL_VERSION,
};

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Get daemon status
    Status,

    /// Start a crawl job
    CrawlStart {
        target_count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category_filter: Option<String>,
    },

    /// Ask the running crawl worker to stop
    CrawlStop,

    /// Snapshot of the current crawl job
    CrawlStatus,

    /// Reset an idle or finished job record
    CrawlClearLogs,

    /// Request daemon shutdown (stops a running crawl first)
    Shutdown,
}

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    /// Daemon status
    DaemonStatus {
        uptime_secs: u64,
        pid: u32,
        crawl: JobStatus,
    },

    /// Crawl job accepted
    CrawlStarted { job_id: String, target_count: u32 },

    /// Crawl job snapshot
    Status { job: Box<JobSnapshot> },

    /// Request refused in the current job state
    Rejected { code: String, message: String },

    /// Error response
    Error { message: String },
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
