// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crawl job request handlers

use std::time::Instant;

use cw_adapters::WorkerAdapter;
use cw_core::{Clock, IdGen};
use cw_engine::{StartRequest, Supervisor, SupervisorError};

use crate::protocol::Response;

/// Map caller misuse to a rejection with its stable code.
fn rejected(e: SupervisorError) -> Response {
    Response::Rejected {
        code: e.code().to_string(),
        message: e.to_string(),
    }
}

pub(super) async fn handle_crawl_start<W, C, G>(
    supervisor: &Supervisor<W, C, G>,
    target_count: u32,
    category_filter: Option<String>,
) -> Response
where
    W: WorkerAdapter,
    C: Clock,
    G: IdGen,
{
    let request = StartRequest {
        target_count,
        category_filter,
    };
    match supervisor.start(request).await {
        Ok(accepted) => Response::CrawlStarted {
            job_id: accepted.job_id.to_string(),
            target_count: accepted.target_count,
        },
        Err(e) => rejected(e),
    }
}

pub(super) async fn handle_crawl_stop<W, C, G>(supervisor: &Supervisor<W, C, G>) -> Response
where
    W: WorkerAdapter,
    C: Clock,
    G: IdGen,
{
    match supervisor.stop().await {
        Ok(()) => Response::Ok,
        Err(e) => rejected(e),
    }
}

pub(super) fn handle_crawl_status<W, C, G>(supervisor: &Supervisor<W, C, G>) -> Response
where
    W: WorkerAdapter,
    C: Clock,
    G: IdGen,
{
    Response::Status {
        job: Box::new(supervisor.status()),
    }
}

pub(super) async fn handle_crawl_clear<W, C, G>(supervisor: &Supervisor<W, C, G>) -> Response
where
    W: WorkerAdapter,
    C: Clock,
    G: IdGen,
{
    match supervisor.clear_logs().await {
        Ok(()) => Response::Ok,
        Err(e) => rejected(e),
    }
}

pub(super) fn handle_daemon_status<W, C, G>(
    supervisor: &Supervisor<W, C, G>,
    start_time: Instant,
) -> Response
where
    W: WorkerAdapter,
    C: Clock,
    G: IdGen,
{
    Response::DaemonStatus {
        uptime_secs: start_time.elapsed().as_secs(),
        pid: std::process::id(),
        crawl: supervisor.status().status,
    }
}
