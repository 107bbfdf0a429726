// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cw-core: Core types for the Crawl Warden job supervisor

pub mod clock;
pub mod id;
pub mod ingest;
pub mod job;
pub mod log_buffer;
pub mod outcome;
pub mod time_fmt;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{IdGen, JobId, SequentialIdGen, UuidIdGen};
pub use ingest::{
    LineSplitter, LogIngestor, OutputRules, OutputStream, DEFAULT_SAVED_MARKER, MAX_LINE_BYTES,
    TRUNCATED_SUFFIX,
};
pub use job::{JobRecord, JobSnapshot, JobStatus, MAX_CATEGORY_BYTES};
pub use log_buffer::{LogBuffer, MAX_ENTRY_BYTES, MAX_LOG_LINES};
pub use outcome::{JobOutcome, WorkerExit};
pub use time_fmt::{format_datetime, format_elapsed, format_span_ms};
