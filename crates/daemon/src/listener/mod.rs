// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! Accepts connections in a spawned task and answers each request against
//! the shared supervisor. Crawl operations never wait on the worker, so a
//! slow crawl cannot block status polling.

mod crawl;

use std::sync::Arc;
use std::time::Instant;

use cw_adapters::WorkerAdapter;
use cw_core::{Clock, IdGen};
use cw_engine::Supervisor;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Listener task for accepting socket connections.
pub struct Listener<W, C, G> {
    socket: UnixListener,
    ctx: Arc<ListenCtx<W, C, G>>,
}

/// Shared state handed to every connection.
pub(crate) struct ListenCtx<W, C, G> {
    pub supervisor: Supervisor<W, C, G>,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl<W, C, G> Listener<W, C, G>
where
    W: WorkerAdapter,
    C: Clock,
    G: IdGen,
{
    pub fn new(
        socket: UnixListener,
        supervisor: Supervisor<W, C, G>,
        start_time: Instant,
        shutdown: Arc<Notify>,
    ) -> Self {
        Self {
            socket,
            ctx: Arc::new(ListenCtx {
                supervisor,
                start_time,
                shutdown,
            }),
        }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(
                                    protocol::ProtocolError::ConnectionClosed,
                                ) => debug!("Client disconnected"),
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection<W, C, G>(
    stream: UnixStream,
    ctx: &ListenCtx<W, C, G>,
) -> Result<(), ConnectionError>
where
    W: WorkerAdapter,
    C: Clock,
    G: IdGen,
{
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;

    // Status polling is frequent; keep it out of the info log
    if matches!(request, Request::CrawlStatus | Request::Status | Request::Ping) {
        debug!(request = ?request, "received query");
    } else {
        tracing::info!(request = ?request, "received request");
    }

    let response = handle_request(request, ctx).await;

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;

    Ok(())
}

/// Handle a single request and return a response.
pub(crate) async fn handle_request<W, C, G>(request: Request, ctx: &ListenCtx<W, C, G>) -> Response
where
    W: WorkerAdapter,
    C: Clock,
    G: IdGen,
{
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Status => crawl::handle_daemon_status(&ctx.supervisor, ctx.start_time),

        Request::CrawlStart {
            target_count,
            category_filter,
        } => crawl::handle_crawl_start(&ctx.supervisor, target_count, category_filter).await,

        Request::CrawlStop => crawl::handle_crawl_stop(&ctx.supervisor).await,

        Request::CrawlStatus => crawl::handle_crawl_status(&ctx.supervisor),

        Request::CrawlClearLogs => crawl::handle_crawl_clear(&ctx.supervisor).await,

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
