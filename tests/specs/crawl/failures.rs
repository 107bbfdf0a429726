//! Crawl failure specs
//!
//! Verify how worker crashes and launch failures surface.

use crate::prelude::*;

#[test]
fn crashing_worker_ends_failed() {
    let warden = Warden::with_worker(FAILING_WORKER);

    let run = warden
        .cw()
        .args(&["crawl", "start", "--wait"])
        .fails()
        .stderr_has("crawl failed (exit code 3): 1 item(s) saved");
    assert_eq!(run.code(), Some(2));

    let job = warden.crawl_json();
    assert_eq!(job["status"], "failed");
    assert_eq!(job["saved_count"], 1);
    assert_eq!(job["outcome"]["kind"], "abnormal_exit");
    let logs = job["logs"].to_string();
    assert!(logs.contains("[ERROR] connection reset"), "logs: {}", logs);
}

#[test]
fn missing_worker_program_is_a_failed_job() {
    let warden = Warden::with_missing_worker();

    // The request is accepted; the launch failure lands on the job.
    warden.cw().args(&["crawl", "start"]).passes();

    let job = warden.wait_for_status("failed");
    assert_eq!(job["outcome"]["kind"], "spawn_error");
    assert_eq!(job["is_running"], false);

    warden
        .cw()
        .args(&["crawl", "status"])
        .passes()
        .stdout_has("Outcome: failed to launch worker: ");
}

#[test]
fn failed_job_can_be_restarted() {
    let warden = Warden::with_worker(FAILING_WORKER);
    warden.cw().args(&["crawl", "start", "--wait"]).fails();

    warden.cw().args(&["crawl", "start"]).passes();
}

#[test]
fn wait_timeout_exits_with_code_3() {
    let warden = Warden::with_worker(SLOW_WORKER);

    let run = warden
        .cw()
        .args(&["crawl", "start", "--wait", "--timeout", "300ms"])
        .fails()
        .stderr_has("timed out waiting for crawl");
    assert_eq!(run.code(), Some(3));

    // Timing out the wait leaves the crawl running.
    assert_eq!(warden.crawl_json()["status"], "running");
}
