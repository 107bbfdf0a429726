// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::IsTerminal;

use cw_core::JobStatus;

pub mod codes {
    /// Section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Muted / secondary text: dark grey
    pub const MUTED: u8 = 240;
    pub const GREEN: u8 = 114;
    pub const YELLOW: u8 = 221;
    pub const RED: u8 = 203;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables, `COLOR=1` forces, otherwise TTY check.
pub fn should_colorize() -> bool {
    if crate::env::no_color() {
        return false;
    }
    if crate::env::force_color() {
        return true;
    }
    std::io::stdout().is_terminal()
}

const RESET: &str = "\x1b[0m";

fn paint(code: u8, text: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[38;5;{code}m{text}{RESET}")
    } else {
        text.to_string()
    }
}

pub fn header(text: &str, colorize: bool) -> String {
    paint(codes::HEADER, text, colorize)
}

pub fn muted(text: &str, colorize: bool) -> String {
    paint(codes::MUTED, text, colorize)
}

/// Status word colored by how the job is doing.
pub fn status(status: JobStatus, colorize: bool) -> String {
    let code = match status {
        JobStatus::Running | JobStatus::Completed => codes::GREEN,
        JobStatus::Stopping => codes::YELLOW,
        JobStatus::Failed => codes::RED,
        JobStatus::Idle => codes::MUTED,
    };
    paint(code, &status.to_string(), colorize)
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
