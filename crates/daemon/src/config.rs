// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration from `<state_dir>/config.toml`.
//!
//! ```toml
//! [worker]
//! program = "python3"
//! args = ["replmoa_crawler.py"]
//! cwd = "/srv/crawler"
//! saved_marker = "[OK] 저장:"
//! terminate_timeout_ms = 5000
//!
//! [worker.env]
//! CRAWLER_HEADLESS = "1"
//! ```
//!
//! Every field is optional. `CW_WORKER_PROGRAM`, `CW_WORKER_ARGS` and
//! `CW_SAVED_MARKER` take precedence over the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cw_core::OutputRules;
use cw_engine::SupervisorConfig;
use serde::Deserialize;

use crate::env;
use crate::lifecycle::LifecycleError;

pub const DEFAULT_WORKER_PROGRAM: &str = "python3";
pub const DEFAULT_WORKER_SCRIPT: &str = "replmoa_crawler.py";

/// Parsed `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub worker: WorkerSection,
}

/// The `[worker]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerSection {
    pub program: Option<PathBuf>,
    pub args: Option<Vec<String>>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub saved_marker: Option<String>,
    pub terminate_timeout_ms: Option<u64>,
}

/// Effective worker settings after env overrides.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub supervisor: SupervisorConfig,
    /// Kill helper timeout; `None` keeps the adapter default
    pub terminate_timeout: Option<Duration>,
}

impl FileConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text)
                .map_err(|e| LifecycleError::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Resolve the worker invocation, applying env overrides.
    pub fn worker_settings(&self) -> WorkerSettings {
        let section = &self.worker;
        let program = env::worker_program()
            .or_else(|| section.program.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKER_PROGRAM));
        let args = env::worker_args()
            .or_else(|| section.args.clone())
            .unwrap_or_else(|| vec![DEFAULT_WORKER_SCRIPT.to_string()]);
        let marker = env::saved_marker()
            .or_else(|| section.saved_marker.clone())
            .unwrap_or_default();

        let mut supervisor = SupervisorConfig::new(program, args);
        supervisor.cwd = section.cwd.clone();
        supervisor.env = section
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        supervisor.rules = OutputRules::new(marker);

        WorkerSettings {
            supervisor,
            terminate_timeout: section.terminate_timeout_ms.map(Duration::from_millis),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
