//! Daemon lifecycle specs
//!
//! Verify daemon start/stop/status and that shutdown stops the crawl.

use crate::prelude::*;

#[test]
fn status_reports_not_running() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["daemon", "status"])
        .passes()
        .stdout_eq("Daemon not running\n");
}

#[test]
fn status_json_reports_not_running() {
    let warden = Warden::with_worker(QUICK_WORKER);

    let status = warden
        .cw()
        .args(&["daemon", "status", "-o", "json"])
        .passes()
        .json();
    assert_eq!(status["status"], "not_running");
}

#[test]
fn start_status_stop() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon started");
    assert!(warden.state_path().join("daemon.sock").exists());
    assert!(warden.state_path().join("daemon.pid").exists());

    warden
        .cw()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Status: running")
        .stdout_has("Crawl: idle");

    warden
        .cw()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon already running");

    warden
        .cw()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon stopped");
    assert!(!warden.state_path().join("daemon.sock").exists());

    warden
        .cw()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn version_matches_when_running() {
    let warden = Warden::with_worker(QUICK_WORKER);
    warden.cw().args(&["daemon", "start"]).passes();

    warden
        .cw()
        .args(&["daemon", "--version"])
        .passes()
        .stdout_has("cwd ");
}

#[test]
fn logs_show_startup() {
    let warden = Warden::with_worker(QUICK_WORKER);
    warden.cw().args(&["daemon", "start"]).passes();

    warden
        .cw()
        .args(&["daemon", "logs", "--no-limit"])
        .passes()
        .stdout_has("--- cwd: starting (pid: ");
}

#[test]
fn logs_without_daemon_ever_started() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["daemon", "logs"])
        .passes()
        .stdout_has("No log file found");
}

#[test]
fn daemon_stop_stops_running_crawl() {
    let warden = Warden::with_worker(SLOW_WORKER);
    warden.cw().args(&["crawl", "start"]).passes();
    assert_eq!(warden.crawl_json()["status"], "running");

    warden
        .cw()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon stopped");

    let log = warden.daemon_log();
    assert!(log.contains("stopping crawl for shutdown"), "daemon log:\n{}", log);
}

#[test]
fn job_is_not_kept_across_restarts() {
    let warden = Warden::with_worker(QUICK_WORKER);
    warden
        .cw()
        .args(&["crawl", "start", "-n", "1", "--wait"])
        .passes();
    warden.cw().args(&["daemon", "restart"]).passes();

    assert_eq!(warden.crawl_json()["status"], "idle");
}
