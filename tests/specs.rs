//! Behavioral specifications for the cw CLI.
//!
//! These tests are black-box: they invoke the CLI binary and verify
//! stdout, stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/help.rs"]
mod cli_help;

// crawl/
#[path = "specs/crawl/control.rs"]
mod crawl_control;
#[path = "specs/crawl/failures.rs"]
mod crawl_failures;
#[path = "specs/crawl/status.rs"]
mod crawl_status;

// daemon/
#[path = "specs/daemon/lifecycle.rs"]
mod daemon_lifecycle;
