//! Crawl start/stop/clear specs
//!
//! Verify the control surface and the rejections that guard the single job.

use crate::prelude::*;

fn logs_contain(job: &serde_json::Value, needle: &str) -> bool {
    job["logs"]
        .as_array()
        .map(|logs| logs.iter().any(|l| l.as_str().unwrap_or("").contains(needle)))
        .unwrap_or(false)
}

#[test]
fn start_auto_starts_daemon_and_reports_job() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["crawl", "start", "-n", "3"])
        .passes()
        .stdout_has("Crawl started: ")
        .stdout_has("(target 3 item(s))");

    warden
        .cw()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Status: running");
}

#[test]
fn start_wait_streams_logs_until_completed() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["crawl", "start", "-n", "3", "--wait"])
        .passes()
        .stdout_has("crawl started: target 3 item(s)")
        .stdout_has("[OK] 저장: item 3")
        .stdout_has("crawl completed: 3 item(s) saved");

    let job = warden.crawl_json();
    assert_eq!(job["status"], "completed");
    assert_eq!(job["saved_count"], 3);
    assert_eq!(job["progress_percent"], 100);
    assert_eq!(job["is_running"], false);
    assert_eq!(job["outcome"]["kind"], "succeeded");
}

#[test]
fn start_json_reports_job_id_and_target() {
    let warden = Warden::with_worker(QUICK_WORKER);

    let started = warden
        .cw()
        .args(&["crawl", "start", "-n", "2", "-o", "json"])
        .passes()
        .json();

    assert_eq!(started["target_count"], 2);
    let job_id = started["job_id"].as_str().unwrap().to_string();
    let job = warden.wait_for_status("completed");
    assert_eq!(job["job_id"], job_id.as_str());
}

#[test]
fn zero_limit_is_raised_to_one() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["crawl", "start", "-n", "0", "--wait"])
        .passes();

    let job = warden.crawl_json();
    assert_eq!(job["target_count"], 1);
    assert_eq!(job["saved_count"], 1);
}

#[test]
fn category_filter_reaches_worker() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["crawl", "start", "-n", "1", "-c", "news", "--wait"])
        .passes()
        .stdout_has("category=news");

    let job = warden.crawl_json();
    assert_eq!(job["category_filter"], "news");
}

#[test]
fn blank_category_means_all_categories() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["crawl", "start", "-n", "1", "-c", "  ", "--wait"])
        .passes();

    let job = warden.crawl_json();
    assert!(job["category_filter"].is_null());
}

#[test]
fn second_start_is_rejected_while_running() {
    let warden = Warden::with_worker(SLOW_WORKER);
    warden.cw().args(&["crawl", "start"]).passes();

    warden
        .cw()
        .args(&["crawl", "start"])
        .fails()
        .stderr_has("a crawl job is already running");

    let job = warden.crawl_json();
    assert_eq!(job["status"], "running");
}

#[test]
fn stop_ends_running_crawl_as_completed() {
    let warden = Warden::with_worker(SLOW_WORKER);
    warden.cw().args(&["crawl", "start"]).passes();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || logs_contain(&warden.crawl_json(), "crawler starting")),
        "worker never started"
    );

    warden
        .cw()
        .args(&["crawl", "stop"])
        .passes()
        .stdout_has("Stop requested");

    let job = warden.wait_for_status("completed");
    assert_eq!(job["outcome"]["kind"], "requested_termination");
    assert!(logs_contain(&job, "stop requested"));
    assert!(job["ended_at"].is_string());
}

#[test]
fn stop_without_job_is_rejected() {
    let warden = Warden::with_worker(QUICK_WORKER);
    warden.cw().args(&["daemon", "start"]).passes();

    warden
        .cw()
        .args(&["crawl", "stop"])
        .fails()
        .stderr_has("no crawl job is running");
}

#[test]
fn stop_without_daemon_is_rejected() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["crawl", "stop"])
        .fails()
        .stderr_has("no crawl job is running");
}

#[test]
fn clear_is_refused_while_running() {
    let warden = Warden::with_worker(SLOW_WORKER);
    warden.cw().args(&["crawl", "start"]).passes();

    warden
        .cw()
        .args(&["crawl", "clear"])
        .fails()
        .stderr_has("cannot clear logs while a crawl job is in progress");
}

#[test]
fn clear_after_finish_resets_to_idle() {
    let warden = Warden::with_worker(QUICK_WORKER);
    warden
        .cw()
        .args(&["crawl", "start", "-n", "2", "--wait"])
        .passes();

    warden
        .cw()
        .args(&["crawl", "clear"])
        .passes()
        .stdout_has("Crawl log cleared");

    let job = warden.crawl_json();
    assert_eq!(job["status"], "idle");
    assert_eq!(job["saved_count"], 0);
    assert_eq!(job["logs"], serde_json::json!([]));
}

#[test]
fn new_crawl_replaces_finished_one() {
    let warden = Warden::with_worker(QUICK_WORKER);
    let first = warden
        .cw()
        .args(&["crawl", "start", "-n", "2", "--wait", "-o", "json"])
        .passes()
        .json();

    let second = warden
        .cw()
        .args(&["crawl", "start", "-n", "1", "--wait", "-o", "json"])
        .passes()
        .json();

    assert_ne!(first["job_id"], second["job_id"]);
    assert_eq!(second["saved_count"], 1);
    assert!(!logs_contain(&second, "item 2"));
}
