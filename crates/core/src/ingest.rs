// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns raw worker output chunks into job log entries and counters.
//!
//! Chunks arrive per stream with arbitrary boundaries. Each stream keeps its
//! own partial-line buffer; only complete lines reach the job record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::JobRecord;
use crate::log_buffer::{format_entry, ERROR_TAG};

/// Literal the crawler prints once per product it persisted.
pub const DEFAULT_SAVED_MARKER: &str = "[OK] 저장:";

/// Keys of the supplementary metrics map.
pub mod metric {
    /// Lines reporting an item skipped as a duplicate.
    pub const SKIPPED: &str = "skipped";
    /// Index of the candidate currently being processed (`[idx/total]`).
    pub const PROCESSED: &str = "processed";
    /// Total candidates discovered by the worker (`[idx/total]`).
    pub const CANDIDATES: &str = "candidates";
    /// Set to 1 once the worker reports it hit its item limit.
    pub const LIMIT_REACHED: &str = "limit_reached";
    /// Lines from stderr or carrying an error tag.
    pub const ERROR_LINES: &str = "error_lines";
}

/// Which worker output stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => write!(f, "stdout"),
            OutputStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// Longest worker line kept, in raw bytes. Longer lines are cut on a
/// character boundary and end with [`TRUNCATED_SUFFIX`].
pub const MAX_LINE_BYTES: usize = 4096;

/// Appended to a line that exceeded [`MAX_LINE_BYTES`].
pub const TRUNCATED_SUFFIX: &str = " …[truncated]";

/// Reassembles newline-delimited lines from arbitrary byte chunks.
///
/// Bytes are held until a `\n` arrives, then the whole line is decoded with
/// lossy UTF-8. Multi-byte characters split across chunks therefore decode
/// intact, and malformed sequences become U+FFFD instead of an error.
///
/// At most `max_line` bytes are ever held. A line that outgrows the limit is
/// emitted at once, truncated, and the rest of it is discarded up to the next
/// `\n`.
#[derive(Debug, Clone)]
pub struct LineSplitter {
    pending: Vec<u8>,
    max_line: usize,
    discarding: bool,
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splitter holding at most `max_line` bytes per line (minimum 4, so a
    /// single character always fits).
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line: max_line.max(4),
            discarding: false,
        }
    }

    /// Feed a chunk; returns every line completed by it (without the
    /// terminator, trailing `\r` stripped).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;
        loop {
            let newline = rest.iter().position(|b| *b == b'\n');
            let segment = match newline {
                Some(pos) => &rest[..pos],
                None => rest,
            };
            if let Some(cut) = self.absorb(segment) {
                lines.push(cut);
            }
            let Some(pos) = newline else { break };
            if self.discarding {
                self.discarding = false;
            } else {
                lines.push(decode_line(&self.pending));
            }
            self.pending.clear();
            rest = &rest[pos + 1..];
        }
        lines
    }

    /// Stream closed: the unterminated remainder (if any) is a complete line.
    pub fn finish(&mut self) -> Option<String> {
        let discarded = std::mem::take(&mut self.discarding);
        if self.pending.is_empty() || discarded {
            self.pending.clear();
            return None;
        }
        let line = decode_line(&self.pending);
        self.pending.clear();
        Some(line)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Bytes currently held for the unterminated line.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Add bytes of the current line. Returns the truncated line when the
    /// segment pushes it past the limit.
    fn absorb(&mut self, segment: &[u8]) -> Option<String> {
        if self.discarding || segment.is_empty() {
            return None;
        }
        let room = self.max_line - self.pending.len();
        if segment.len() <= room {
            self.pending.extend_from_slice(segment);
            return None;
        }
        self.pending.extend_from_slice(&segment[..room]);
        let keep = complete_prefix_len(&self.pending);
        let mut line = decode_line(&self.pending[..keep]);
        line.push_str(TRUNCATED_SUFFIX);
        self.pending.clear();
        self.discarding = true;
        Some(line)
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Length of `bytes` without a trailing, incomplete UTF-8 sequence.
fn complete_prefix_len(bytes: &[u8]) -> usize {
    let is_continuation = |b: u8| b & 0xC0 == 0x80;
    let mut start = bytes.len();
    while start > 0 && bytes.len() - start < 4 {
        start -= 1;
        if !is_continuation(bytes[start]) {
            break;
        }
    }
    let Some(&lead) = bytes.get(start) else {
        return bytes.len();
    };
    let width = match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    };
    if start + width > bytes.len() {
        start
    } else {
        bytes.len()
    }
}

/// Pattern rules applied to every complete line.
#[derive(Debug, Clone)]
pub struct OutputRules {
    saved_marker: String,
}

impl Default for OutputRules {
    fn default() -> Self {
        Self::new(DEFAULT_SAVED_MARKER)
    }
}

impl OutputRules {
    /// Rules recognizing `saved_marker` as the one-item-saved signal.
    /// An empty marker falls back to [`DEFAULT_SAVED_MARKER`].
    pub fn new(saved_marker: impl Into<String>) -> Self {
        let saved_marker = saved_marker.into();
        let saved_marker = if saved_marker.is_empty() {
            DEFAULT_SAVED_MARKER.to_string()
        } else {
            saved_marker
        };
        Self { saved_marker }
    }

    pub fn saved_marker(&self) -> &str {
        &self.saved_marker
    }

    pub fn is_saved(&self, line: &str) -> bool {
        line.contains(&self.saved_marker)
    }

    /// Update `record`'s counters for one line.
    fn apply(&self, record: &mut JobRecord, stream: OutputStream, line: &str) {
        if self.is_saved(line) {
            record.saved_count += 1;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with("[SKIP]") {
            record.bump_metric(metric::SKIPPED, 1);
        }
        if trimmed.starts_with("[STOP]") {
            record.set_metric(metric::LIMIT_REACHED, 1);
        }
        if let Some((idx, total)) = parse_progress(trimmed) {
            record.set_metric(metric::PROCESSED, idx);
            record.set_metric(metric::CANDIDATES, total);
        }
        if stream == OutputStream::Stderr || line.contains(ERROR_TAG) {
            record.bump_metric(metric::ERROR_LINES, 1);
        }
    }
}

/// Parse a `[idx/total]` progress prefix.
fn parse_progress(line: &str) -> Option<(u64, u64)> {
    let inner = line.strip_prefix('[')?;
    let (inner, _) = inner.split_once(']')?;
    let (idx, total) = inner.split_once('/')?;
    let idx = idx.trim().parse().ok()?;
    let total = total.trim().parse().ok()?;
    Some((idx, total))
}

/// Per-job ingestion state: one splitter per stream plus the pattern rules.
#[derive(Debug, Clone, Default)]
pub struct LogIngestor {
    stdout: LineSplitter,
    stderr: LineSplitter,
    rules: OutputRules,
}

impl LogIngestor {
    pub fn new(rules: OutputRules) -> Self {
        Self {
            stdout: LineSplitter::new(),
            stderr: LineSplitter::new(),
            rules,
        }
    }

    pub fn rules(&self) -> &OutputRules {
        &self.rules
    }

    /// Feed one chunk from `stream`. Returns the number of entries appended.
    pub fn ingest(
        &mut self,
        record: &mut JobRecord,
        stream: OutputStream,
        chunk: &[u8],
        now_ms: u64,
    ) -> usize {
        let lines = self.splitter(stream).push(chunk);
        lines
            .iter()
            .filter(|line| self.append_line(record, stream, line, now_ms))
            .count()
    }

    /// Flush unterminated trailing lines of both streams (worker exited).
    pub fn finish(&mut self, record: &mut JobRecord, now_ms: u64) -> usize {
        let mut appended = 0;
        for stream in [OutputStream::Stdout, OutputStream::Stderr] {
            if let Some(line) = self.splitter(stream).finish() {
                if self.append_line(record, stream, &line, now_ms) {
                    appended += 1;
                }
            }
        }
        appended
    }

    fn splitter(&mut self, stream: OutputStream) -> &mut LineSplitter {
        match stream {
            OutputStream::Stdout => &mut self.stdout,
            OutputStream::Stderr => &mut self.stderr,
        }
    }

    /// Blank lines are dropped; everything else is classified and appended.
    fn append_line(
        &self,
        record: &mut JobRecord,
        stream: OutputStream,
        line: &str,
        now_ms: u64,
    ) -> bool {
        let line = line.trim_end();
        if line.trim().is_empty() {
            return false;
        }
        self.rules.apply(record, stream, line);
        record
            .logs
            .push(format_entry(now_ms, stream == OutputStream::Stderr, line));
        true
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
