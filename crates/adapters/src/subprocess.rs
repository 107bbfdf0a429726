// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Run a short-lived helper command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed if the timeout elapses.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Build the platform command that asks process `pid` to terminate.
///
/// POSIX targets get a SIGTERM so the worker can shut down cleanly. Targets
/// without signals force-kill the whole process tree, since crawler
/// implementations may fork helpers.
#[cfg(unix)]
pub fn terminate_command(pid: u32) -> Command {
    let mut cmd = Command::new("kill");
    cmd.arg("-TERM").arg(pid.to_string());
    cmd
}

#[cfg(not(unix))]
pub fn terminate_command(pid: u32) -> Command {
    let mut cmd = Command::new("taskkill");
    cmd.arg("/PID").arg(pid.to_string()).arg("/T").arg("/F");
    cmd
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
