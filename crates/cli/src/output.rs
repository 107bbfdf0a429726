// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt::Write;

use clap::ValueEnum;
use cw_core::time_fmt::format_rfc3339;
use cw_core::{format_datetime, format_span_ms, JobSnapshot};
use serde::Serialize;

use crate::color;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Last `n` entries of `logs`, or all of them when `n` is `None`.
pub fn tail(logs: &[String], n: Option<usize>) -> &[String] {
    match n {
        Some(n) => &logs[logs.len().saturating_sub(n)..],
        None => logs,
    }
}

/// Multi-line text rendering of a job snapshot.
pub fn render_job(job: &JobSnapshot, lines: Option<usize>, now_ms: u64, colorize: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Status: {}", color::status(job.status, colorize));

    let Some(job_id) = &job.job_id else {
        let _ = writeln!(out, "{}", color::muted("No crawl job yet", colorize));
        return out;
    };

    let _ = writeln!(out, "Job: {}", job_id);
    match &job.category_filter {
        Some(c) => {
            let _ = writeln!(out, "Target: {} item(s), category '{}'", job.target_count, c);
        }
        None => {
            let _ = writeln!(out, "Target: {} item(s)", job.target_count);
        }
    }
    let _ = writeln!(
        out,
        "Saved: {}/{} ({}%)",
        job.saved_count, job.target_count, job.progress_percent
    );
    if let Some(started) = job.started_at_ms {
        let end = job.ended_at_ms.unwrap_or(now_ms);
        let _ = writeln!(
            out,
            "Started: {} ({})",
            format_datetime(started),
            format_span_ms(started, end)
        );
    }
    if let Some(ended) = job.ended_at_ms {
        let _ = writeln!(out, "Ended: {}", format_datetime(ended));
    }
    if let Some(outcome) = &job.outcome {
        let _ = writeln!(out, "Outcome: {}", outcome.summary(job.saved_count));
    }
    if !job.metrics.is_empty() {
        let metrics: Vec<String> = job
            .metrics
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        let _ = writeln!(out, "Metrics: {}", metrics.join(" "));
    }

    let shown = tail(&job.logs, lines);
    let _ = writeln!(out);
    let mut heading = format!("Logs ({} of {}", shown.len(), job.logs.len());
    if job.dropped_lines > 0 {
        let _ = write!(heading, ", {} dropped", job.dropped_lines);
    }
    heading.push_str("):");
    let _ = writeln!(out, "{}", color::header(&heading, colorize));
    for line in shown {
        let _ = writeln!(out, "  {}", line);
    }
    out
}

/// JSON rendering of a job snapshot: the wire snapshot plus RFC 3339 times.
pub fn job_json(job: &JobSnapshot, lines: Option<usize>) -> serde_json::Value {
    let mut job = job.clone();
    job.logs = tail(&job.logs, lines).to_vec();
    let mut value = serde_json::to_value(&job).unwrap_or(serde_json::Value::Null);
    if let Some(obj) = value.as_object_mut() {
        if let Some(s) = job.started_at_ms.and_then(format_rfc3339) {
            obj.insert("started_at".to_string(), s.into());
        }
        if let Some(s) = job.ended_at_ms.and_then(format_rfc3339) {
            obj.insert("ended_at".to_string(), s.into());
        }
    }
    value
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
