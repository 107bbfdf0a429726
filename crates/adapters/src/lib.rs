// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the external crawl worker

mod env;
pub mod subprocess;
pub mod traced;
pub mod worker;

pub use traced::TracedWorker;
pub use worker::{
    ProcessWorkerAdapter, WorkerAdapter, WorkerError, WorkerEvent, WorkerHandle,
    WorkerSpawnConfig, ENV_CATEGORY_FILTER, ENV_CRAWL_LIMIT, ENV_UNBUFFERED,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use worker::{FakeStep, FakeWorkerAdapter, TerminateBehavior, WorkerCall};
