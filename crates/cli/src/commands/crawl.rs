// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cw crawl` - Crawl job commands

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use cw_core::{JobSnapshot, JobStatus};

use crate::client::DaemonClient;
use crate::color;
use crate::exit_error::ExitError;
use crate::output::{job_json, now_ms, print_json, render_job, OutputFormat};
use crate::follow::{self, CrawlFollower, FollowEnd};

/// Exit code when a waited-on crawl ends in `failed`.
const EXIT_JOB_FAILED: i32 = 2;
/// Exit code when `--timeout` elapses before the crawl ends.
const EXIT_WAIT_TIMEOUT: i32 = 3;
/// Exit code after Ctrl+C during `--wait`.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Args)]
pub struct CrawlArgs {
    #[command(subcommand)]
    pub command: CrawlCommand,
}

#[derive(Subcommand)]
pub enum CrawlCommand {
    /// Start a crawl job
    Start {
        /// Number of items to collect (values below 1 are raised to 1)
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: u32,
        /// Only crawl this category
        #[arg(short, long)]
        category: Option<String>,
        /// Follow the job log until the crawl ends
        #[arg(long)]
        wait: bool,
        /// Give up waiting after this long (e.g. "90s", "5m")
        #[arg(long, requires = "wait", value_parser = parse_duration)]
        timeout: Option<Duration>,
    },
    /// Ask the running crawl to stop
    Stop,
    /// Show the current crawl job
    Status {
        /// Number of recent log lines to show
        #[arg(short = 'n', long, default_value_t = 20)]
        lines: usize,
        /// Show every retained log line
        #[arg(long, conflicts_with = "lines")]
        all: bool,
    },
    /// Clear the log of a finished crawl
    Clear,
}

/// Crawl commands that change job state may start the daemon.
pub fn is_action(command: &CrawlCommand) -> bool {
    matches!(command, CrawlCommand::Start { .. })
}

pub async fn handle(command: CrawlCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        CrawlCommand::Start {
            limit,
            category,
            wait,
            timeout,
        } => start(client, limit, category, wait, timeout, format).await,
        CrawlCommand::Stop => stop(client, format).await,
        CrawlCommand::Status { lines, all } => {
            let job = client.crawl_status().await?;
            let lines = (!all).then_some(lines);
            match format {
                OutputFormat::Text => print!(
                    "{}",
                    render_job(&job, lines, now_ms(), color::should_colorize())
                ),
                OutputFormat::Json => print_json(&job_json(&job, lines))?,
            }
            Ok(())
        }
        CrawlCommand::Clear => {
            client.crawl_clear().await?;
            match format {
                OutputFormat::Text => println!("Crawl log cleared"),
                OutputFormat::Json => print_json(&serde_json::json!({ "cleared": true }))?,
            }
            Ok(())
        }
    }
}

async fn start(
    client: &DaemonClient,
    limit: u32,
    category: Option<String>,
    wait: bool,
    timeout: Option<Duration>,
    format: OutputFormat,
) -> Result<()> {
    let category = category.filter(|c| !c.trim().is_empty());
    let started = client.crawl_start(limit, category.clone()).await?;

    if !wait {
        match format {
            OutputFormat::Text => {
                let scope = category
                    .map(|c| format!(", category '{}'", c))
                    .unwrap_or_default();
                println!(
                    "Crawl started: {} (target {} item(s){})",
                    started.job_id, started.target_count, scope
                );
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "job_id": started.job_id,
                "target_count": started.target_count,
            }))?,
        }
        return Ok(());
    }

    if format == OutputFormat::Text {
        println!("Crawl started: {}", started.job_id);
    }
    let job = follow(client, &started.job_id, timeout, format).await?;
    if format == OutputFormat::Json {
        print_json(&job_json(&job, None))?;
    }
    match job.status {
        JobStatus::Failed => {
            let summary = job
                .outcome
                .as_ref()
                .map(|o| o.summary(job.saved_count))
                .unwrap_or_else(|| "crawl failed".to_string());
            Err(ExitError::new(EXIT_JOB_FAILED, summary).into())
        }
        _ => Ok(()),
    }
}

/// Poll until the job leaves Running/Stopping, streaming new log lines in text mode.
async fn follow(
    client: &DaemonClient,
    job_id: &str,
    timeout: Option<Duration>,
    format: OutputFormat,
) -> Result<JobSnapshot> {
    let follower = CrawlFollower::new(job_id, crate::env::wait_poll(), timeout);
    let end = follower
        .run(
            move || client.crawl_status(),
            follow::ctrl_c(),
            |line| {
                if format == OutputFormat::Text {
                    println!("{}", line);
                }
            },
        )
        .await?;
    match end {
        FollowEnd::Finished(job) => Ok(*job),
        FollowEnd::Replaced => {
            Err(ExitError::new(1, format!("crawl {} was replaced", job_id)).into())
        }
        FollowEnd::TimedOut => Err(ExitError::new(
            EXIT_WAIT_TIMEOUT,
            format!("timed out waiting for crawl {}", job_id),
        )
        .into()),
        FollowEnd::Interrupted => Err(ExitError::new(EXIT_INTERRUPTED, "interrupted").into()),
    }
}

async fn stop(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    client.crawl_stop().await?;
    match format {
        OutputFormat::Text => println!("Stop requested"),
        OutputFormat::Json => print_json(&serde_json::json!({ "stop_requested": true }))?,
    }
    Ok(())
}

/// Parse "30s", "5m", "1h" or bare seconds.
pub(crate) fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(i) => s.split_at(i),
        None => (s, "s"),
    };
    let n: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{}'", s))?;
    let secs = match unit {
        "ms" => return Ok(Duration::from_millis(n)),
        "s" => Some(n),
        "m" => n.checked_mul(60),
        "h" => n.checked_mul(3600),
        _ => return Err(format!("invalid duration unit in '{}'", s)),
    };
    secs.map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

#[cfg(test)]
#[path = "crawl_tests.rs"]
mod tests;
