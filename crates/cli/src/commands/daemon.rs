// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cw daemon` - Daemon management commands

use crate::client::DaemonClient;
use crate::client_lifecycle::daemon_stop;
use crate::daemon_process::{find_cwd_binary, StateDir};
use crate::output::{print_json, OutputFormat};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use std::path::Path;
use std::process::Command;

#[derive(Args)]
pub struct DaemonArgs {
    /// Print daemon version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    #[command(subcommand)]
    pub command: Option<DaemonCommand>,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (foreground or background)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon, stopping any running crawl first
    Stop,
    /// Check daemon status
    Status,
    /// Stop and restart the daemon
    Restart,
    /// View daemon logs
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Show all lines (no limit)
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
    },
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    if args.version {
        return version(format).await;
    }

    match args.command {
        Some(DaemonCommand::Start { foreground }) => start(foreground).await,
        Some(DaemonCommand::Stop) => stop().await,
        Some(DaemonCommand::Restart) => restart().await,
        Some(DaemonCommand::Status) => status(format).await,
        Some(DaemonCommand::Logs { limit, no_limit }) => logs(limit, no_limit, format),
        None => status(format).await,
    }
}

fn not_running(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("Daemon not running"),
        OutputFormat::Json => println!(r#"{{ "status": "not_running" }}"#),
    }
    Ok(())
}

async fn version(format: OutputFormat) -> Result<()> {
    let Ok(client) = DaemonClient::connect() else {
        return not_running(format);
    };

    let version = match client.hello().await {
        Ok(v) => v,
        Err(ref e) if e.is_not_running() => return not_running(format),
        Err(_) => "unknown".to_string(),
    };

    match format {
        OutputFormat::Text => println!("cwd {}", version),
        OutputFormat::Json => print_json(&serde_json::json!({ "version": version }))?,
    }
    Ok(())
}

async fn start(foreground: bool) -> Result<()> {
    if foreground {
        let status = Command::new(find_cwd_binary()).status()?;
        if !status.success() {
            return Err(anyhow!("Daemon exited with status: {}", status));
        }
        return Ok(());
    }

    if let Ok(client) = DaemonClient::connect() {
        if let Ok(status) = client.status().await {
            println!("Daemon already running (uptime: {})", format_uptime(status.uptime_secs));
            return Ok(());
        }
    }

    match DaemonClient::connect_or_start() {
        Ok(_client) => {
            println!("Daemon started");
            Ok(())
        }
        Err(e) => Err(anyhow!("{}", e)),
    }
}

async fn stop() -> Result<()> {
    match daemon_stop().await {
        Ok(true) => {
            println!("Daemon stopped");
            Ok(())
        }
        Ok(false) => {
            println!("Daemon not running");
            Ok(())
        }
        Err(e) => Err(anyhow!("Failed to stop daemon: {}", e)),
    }
}

async fn restart() -> Result<()> {
    let was_running = daemon_stop()
        .await
        .map_err(|e| anyhow!("Failed to stop daemon: {}", e))?;

    if was_running {
        // Give the OS a moment to release the socket.
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }

    match DaemonClient::connect_or_start() {
        Ok(_client) => {
            println!("Daemon restarted");
            Ok(())
        }
        Err(e) => Err(anyhow!("{}", e)),
    }
}

async fn status(format: OutputFormat) -> Result<()> {
    let Ok(client) = DaemonClient::connect() else {
        return not_running(format);
    };

    let status = match client.status().await {
        Ok(s) => s,
        Err(ref e) if e.is_not_running() => return not_running(format),
        Err(e) => return Err(anyhow!("{}", e)),
    };
    let version = client
        .hello()
        .await
        .unwrap_or_else(|_| "unknown".to_string());

    match format {
        OutputFormat::Text => {
            println!("Status: running");
            println!("Version: {}", version);
            println!("Pid: {}", status.pid);
            println!("Uptime: {}", format_uptime(status.uptime_secs));
            println!("Crawl: {}", status.crawl);
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "status": "running",
            "version": version,
            "pid": status.pid,
            "uptime_secs": status.uptime_secs,
            "uptime": format_uptime(status.uptime_secs),
            "crawl": status.crawl,
        }))?,
    }
    Ok(())
}

fn logs(limit: usize, no_limit: bool, format: OutputFormat) -> Result<()> {
    let log_path = StateDir::locate()?.log();

    if !log_path.exists() {
        match format {
            OutputFormat::Text => println!("No log file found at {}", log_path.display()),
            OutputFormat::Json => print_json(&serde_json::json!({
                "log_path": log_path.to_string_lossy(),
                "lines": [],
            }))?,
        }
        return Ok(());
    }

    let lines = if no_limit {
        read_last_lines(&log_path, usize::MAX)?
    } else {
        read_last_lines(&log_path, limit)?
    };
    match format {
        OutputFormat::Text => {
            for line in &lines {
                println!("{}", line);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "log_path": log_path.to_string_lossy(),
            "lines": lines,
        }))?,
    }
    Ok(())
}

fn read_last_lines(path: &Path, n: usize) -> Result<Vec<String>> {
    use std::io::{BufRead, BufReader};
    let file = std::fs::File::open(path)?;
    let mut lines: Vec<String> = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<_>>()?;
    let start = lines.len().saturating_sub(n);
    Ok(lines.split_off(start))
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
