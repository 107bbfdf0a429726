// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framing for the CLI/daemon socket.
//!
//! Each frame is a 4-byte big-endian length followed by that many bytes of
//! JSON. Requests and responses have separate size limits: requests are a
//! handful of small fields, while a status response carries the whole job
//! log buffer.

use cw_core::{MAX_CATEGORY_BYTES, MAX_ENTRY_BYTES, MAX_LOG_LINES};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::{Request, Response};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} too large: {size} bytes (max {max})")]
    MessageTooLarge {
        kind: FrameKind,
        size: usize,
        max: usize,
    },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

/// Worst-case growth of log text when written as a JSON string (`\u001b`).
const JSON_ESCAPE_FACTOR: usize = 6;

/// Room for the fixed snapshot fields, ids and error text.
const FRAME_HEADROOM: usize = 64 * 1024;

/// Largest request frame.
pub const MAX_REQUEST_SIZE: usize = MAX_CATEGORY_BYTES * JSON_ESCAPE_FACTOR + FRAME_HEADROOM;

/// Largest response frame: a full log buffer of maximum-length entries,
/// every byte escaped.
pub const MAX_RESPONSE_SIZE: usize =
    MAX_LOG_LINES * MAX_ENTRY_BYTES * JSON_ESCAPE_FACTOR + MAX_REQUEST_SIZE;

/// Default IPC timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Protocol version (crate version plus build hash)
pub const PROTOCOL_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// Which side of the exchange a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Request,
    Response,
}

impl FrameKind {
    pub fn max_size(self) -> usize {
        match self {
            FrameKind::Request => MAX_REQUEST_SIZE,
            FrameKind::Response => MAX_RESPONSE_SIZE,
        }
    }

    fn check(self, size: usize) -> Result<(), ProtocolError> {
        let max = self.max_size();
        if size > max {
            return Err(ProtocolError::MessageTooLarge {
                kind: self,
                size,
                max,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Request => write!(f, "request"),
            FrameKind::Response => write!(f, "response"),
        }
    }
}

/// Serialize `msg` to JSON, refusing payloads over the limit for `kind`.
pub fn encode<T: Serialize>(msg: &T, kind: FrameKind) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;
    kind.check(json.len())?;
    Ok(json)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one frame. The length prefix is checked before any payload is
/// buffered.
pub async fn read_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    kind: FrameKind,
) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    kind.check(len)?;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    data: &[u8],
    kind: FrameKind,
) -> Result<(), ProtocolError> {
    kind.check(data.len())?;
    writer.write_all(&(data.len() as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

async fn within<F, T>(timeout: Duration, fut: F) -> Result<T, ProtocolError>
where
    F: std::future::Future<Output = Result<T, ProtocolError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

/// Daemon side: read the client's request.
pub async fn read_request<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let bytes = within(timeout, read_frame(reader, FrameKind::Request)).await?;
    decode(&bytes)
}

/// Daemon side: answer the request.
pub async fn write_response<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response, FrameKind::Response)?;
    within(timeout, write_frame(writer, &data, FrameKind::Response)).await
}

/// Client side: send a request.
pub async fn write_request<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    request: &Request,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(request, FrameKind::Request)?;
    within(timeout, write_frame(writer, &data, FrameKind::Request)).await
}

/// Client side: wait for the daemon's answer.
pub async fn read_response<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Response, ProtocolError> {
    let bytes = within(timeout, read_frame(reader, FrameKind::Response)).await?;
    decode(&bytes)
}
