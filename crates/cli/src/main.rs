// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cw - Crawl Warden CLI

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod client_lifecycle;
mod color;
mod commands;
mod daemon_process;
mod env;
mod exit_error;
mod follow;
mod output;

use output::OutputFormat;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use commands::{crawl, daemon};
use cw_core::JobSnapshot;

use crate::client::{ClientError, DaemonClient};

#[derive(Parser)]
#[command(name = "cw", version, about = "Crawl Warden - supervise the crawl worker")]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl job control
    Crawl(crawl::CrawlArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

pub(crate) fn cli_command() -> clap::Command {
    Cli::command()
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

/// Format an anyhow error, skipping the cause chain when the top-level
/// message already contains every cause.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Daemon(args) => daemon::daemon(args, format).await,
        Commands::Crawl(args) => {
            // Start auto-starts the daemon; everything else only connects.
            if crawl::is_action(&args.command) {
                let client = DaemonClient::for_action()?;
                return crawl::handle(args.command, &client, format).await;
            }
            match DaemonClient::for_query() {
                Ok(client) => crawl::handle(args.command, &client, format).await,
                Err(e) if e.is_not_running() => crawl_without_daemon(args.command, format),
                Err(e) => Err(e.into()),
            }
        }
    }
}

/// A stopped daemon holds no job: status is idle, stop has nothing to stop.
fn crawl_without_daemon(command: crawl::CrawlCommand, format: OutputFormat) -> Result<()> {
    use crawl::CrawlCommand;
    match command {
        CrawlCommand::Status { .. } => {
            let job = JobSnapshot::default();
            match format {
                OutputFormat::Text => {
                    print!(
                        "{}",
                        output::render_job(&job, None, output::now_ms(), color::should_colorize())
                    );
                    println!("{}", color::muted("(daemon not running)", color::should_colorize()));
                }
                OutputFormat::Json => output::print_json(&output::job_json(&job, None))?,
            }
            Ok(())
        }
        CrawlCommand::Stop => Err(ClientError::Rejected {
            code: "not_running".to_string(),
            message: "no crawl job is running".to_string(),
        }
        .into()),
        CrawlCommand::Clear => {
            match format {
                OutputFormat::Text => println!("Crawl log cleared"),
                OutputFormat::Json => {
                    output::print_json(&serde_json::json!({ "cleared": true }))?
                }
            }
            Ok(())
        }
        // Routed through for_action above
        CrawlCommand::Start { .. } => Err(ClientError::DaemonNotRunning.into()),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
