// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded job log buffer with FIFO eviction.

use std::collections::VecDeque;

use crate::ingest::{MAX_LINE_BYTES, TRUNCATED_SUFFIX};
use crate::time_fmt::log_timestamp;

/// Number of log entries a job keeps; older entries are evicted first.
pub const MAX_LOG_LINES: usize = 500;

/// Longest entry kept, in bytes: a full worker line plus the timestamp,
/// error tag and truncation suffix.
pub const MAX_ENTRY_BYTES: usize = MAX_LINE_BYTES + 64;

/// Tag prepended to entries that came from the worker's stderr or that
/// describe a failure.
pub const ERROR_TAG: &str = "[ERROR]";

/// Format a display entry: `"[14:03:07] text"` or `"[14:03:07] [ERROR] text"`.
pub fn format_entry(epoch_ms: u64, error: bool, text: &str) -> String {
    if error {
        format!("[{}] {} {}", log_timestamp(epoch_ms), ERROR_TAG, text)
    } else {
        format!("[{}] {}", log_timestamp(epoch_ms), text)
    }
}

/// Ring buffer of formatted log entries.
///
/// Exceeding the capacity is not an error: the oldest entry is dropped and
/// counted in [`LogBuffer::dropped`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBuffer {
    entries: VecDeque<String>,
    capacity: usize,
    dropped: u64,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(MAX_LOG_LINES)
    }
}

impl LogBuffer {
    /// Create a buffer holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(MAX_LOG_LINES)),
            capacity,
            dropped: 0,
        }
    }

    /// Append an entry, evicting from the front until the bound holds.
    /// Entries longer than [`MAX_ENTRY_BYTES`] are truncated.
    ///
    /// Returns the number of entries evicted by this push.
    pub fn push(&mut self, entry: String) -> usize {
        self.entries.push_back(clamp_entry(entry));
        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            evicted += 1;
        }
        self.dropped += evicted as u64;
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total entries evicted since the last [`LogBuffer::clear`].
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Copy out all retained entries, oldest first.
    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dropped = 0;
    }
}

fn clamp_entry(mut entry: String) -> String {
    if entry.len() <= MAX_ENTRY_BYTES {
        return entry;
    }
    let mut cut = MAX_ENTRY_BYTES - TRUNCATED_SUFFIX.len();
    while !entry.is_char_boundary(cut) {
        cut -= 1;
    }
    entry.truncate(cut);
    entry.push_str(TRUNCATED_SUFFIX);
    entry
}

#[cfg(test)]
#[path = "log_buffer_tests.rs"]
mod tests;
