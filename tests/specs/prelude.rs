//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving the cw CLI against an isolated state
//! directory and a scripted worker.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Aggressive timeouts for fast tests.
const CW_TIMEOUT_CONNECT_MS: &str = "2000";
const CW_TIMEOUT_EXIT_MS: &str = "2000";
const CW_TIMEOUT_IPC_MS: &str = "1000";
const CW_CONNECT_POLL_MS: &str = "5";
const CW_POLL_MS: &str = "50";
const CW_TERMINATE_TIMEOUT_MS: &str = "1000";
const CW_DRAIN_GRACE_MS: &str = "500";
const CW_SHUTDOWN_TIMEOUT_MS: &str = "1000";

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 20;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Returns the path to a binary, checking the llvm-cov target directory first.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    // Let assert_cmd resolve it against the build's target directory.
    let resolved = assert_cmd::cargo::cargo_bin(name);
    if resolved.exists() {
        return resolved;
    }

    standard
}

pub fn cwd_binary() -> PathBuf {
    binary_path("cwd")
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: vec![
                ("CW_DAEMON_BINARY".into(), cwd_binary().to_string_lossy().into()),
                ("CW_TIMEOUT_CONNECT_MS".into(), CW_TIMEOUT_CONNECT_MS.into()),
                ("CW_TIMEOUT_EXIT_MS".into(), CW_TIMEOUT_EXIT_MS.into()),
                ("CW_TIMEOUT_IPC_MS".into(), CW_TIMEOUT_IPC_MS.into()),
                ("CW_CONNECT_POLL_MS".into(), CW_CONNECT_POLL_MS.into()),
                ("CW_POLL_MS".into(), CW_POLL_MS.into()),
                ("CW_TERMINATE_TIMEOUT_MS".into(), CW_TERMINATE_TIMEOUT_MS.into()),
                ("CW_DRAIN_GRACE_MS".into(), CW_DRAIN_GRACE_MS.into()),
                ("CW_SHUTDOWN_TIMEOUT_MS".into(), CW_SHUTDOWN_TIMEOUT_MS.into()),
                ("NO_COLOR".into(), "1".into()),
            ],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Build the command without running it
    pub fn command(self) -> Command {
        let mut cmd = Command::new(binary_path("cw"));
        cmd.args(&self.args);

        // Keep the caller's worker settings out of the test daemon.
        for key in [
            "CW_WORKER_PROGRAM",
            "CW_WORKER_ARGS",
            "CW_SAVED_MARKER",
            "XDG_STATE_HOME",
        ] {
            cmd.env_remove(key);
        }
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Parse stdout as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout())
            .unwrap_or_else(|e| panic!("stdout is not JSON ({}): {}", e, self.stdout()))
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = self.stdout();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Workers
// =============================================================================

/// Saves `$CRAWL_LIMIT` items, one marker line each.
pub const QUICK_WORKER: &str = r#"
echo "crawler starting, category=${CATEGORY_FILTER}"
i=0
while [ "$i" -lt "$CRAWL_LIMIT" ]; do
    i=$((i + 1))
    echo "[OK] 저장: item $i"
done
echo "done"
"#;

/// Runs until terminated; exits 0 on SIGTERM.
pub const SLOW_WORKER: &str = r#"
trap 'echo "shutting down"; exit 0' TERM
echo "crawler starting"
while true; do
    sleep 0.05
done
"#;

/// Saves one item then crashes.
pub const FAILING_WORKER: &str = r#"
echo "[OK] 저장: first"
echo "connection reset" >&2
exit 3
"#;

// =============================================================================
// Warden
// =============================================================================

/// Isolated state directory plus the worker script the daemon launches.
pub struct Warden {
    state_dir: tempfile::TempDir,
    worker_dir: tempfile::TempDir,
    worker_program: Option<PathBuf>,
}

impl Warden {
    /// A warden whose worker runs `script` under /bin/sh.
    pub fn with_worker(script: &str) -> Self {
        let worker_dir = tempfile::tempdir().unwrap();
        std::fs::write(worker_dir.path().join("worker.sh"), script).unwrap();
        Self {
            state_dir: tempfile::tempdir().unwrap(),
            worker_dir,
            worker_program: None,
        }
    }

    /// A warden whose worker program does not exist.
    pub fn with_missing_worker() -> Self {
        let mut warden = Self::with_worker("");
        warden.worker_program = Some(warden.worker_dir.path().join("no-such-crawler"));
        warden
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn worker_script(&self) -> PathBuf {
        self.worker_dir.path().join("worker.sh")
    }

    /// Run a cw command against this warden's daemon.
    pub fn cw(&self) -> CliBuilder {
        let builder = CliBuilder::new().env("CW_STATE_DIR", self.state_path());
        match &self.worker_program {
            Some(program) => builder
                .env("CW_WORKER_PROGRAM", program)
                .env("CW_WORKER_ARGS", ""),
            None => builder
                .env("CW_WORKER_PROGRAM", "/bin/sh")
                .env("CW_WORKER_ARGS", self.worker_script()),
        }
    }

    /// Current crawl snapshot as JSON.
    pub fn crawl_json(&self) -> serde_json::Value {
        self.cw()
            .args(&["crawl", "status", "--all", "-o", "json"])
            .passes()
            .json()
    }

    /// Wait until the crawl reaches `status`.
    pub fn wait_for_status(&self, status: &str) -> serde_json::Value {
        let mut last = serde_json::Value::Null;
        let reached = wait_for(SPEC_WAIT_MAX_MS, || {
            last = self.crawl_json();
            last["status"] == status
        });
        assert!(
            reached,
            "crawl never reached '{}', last snapshot: {}\ndaemon log:\n{}",
            status,
            last,
            self.daemon_log()
        );
        last
    }

    /// Read the daemon log file contents (for debugging test failures)
    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("daemon.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }
}

impl Drop for Warden {
    fn drop(&mut self) {
        // Always try to stop the daemon (no-op if not running)
        let mut cmd = self.cw().args(&["daemon", "stop"]).command();
        cmd.stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        let _ = cmd.status();
    }
}
