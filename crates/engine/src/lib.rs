// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Crawl Warden supervision engine

mod error;
mod pump;
mod supervisor;

pub use error::SupervisorError;
pub use supervisor::{StartAccepted, StartRequest, Supervisor, SupervisorConfig};
