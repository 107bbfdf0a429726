//! Crawl status specs
//!
//! Verify the text and JSON renderings of the job snapshot.

use crate::prelude::*;

#[test]
fn status_without_daemon_is_idle() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["crawl", "status"])
        .passes()
        .stdout_has("Status: idle")
        .stdout_has("No crawl job yet");
}

#[test]
fn status_json_without_daemon_is_idle_snapshot() {
    let warden = Warden::with_worker(QUICK_WORKER);

    let job = warden
        .cw()
        .args(&["crawl", "status", "-o", "json"])
        .passes()
        .json();

    assert_eq!(job["status"], "idle");
    assert!(job["job_id"].is_null());
    assert_eq!(job["is_running"], false);
    assert_eq!(job["logs"], serde_json::json!([]));
}

#[test]
fn status_text_after_completion() {
    let warden = Warden::with_worker(QUICK_WORKER);
    warden
        .cw()
        .args(&["crawl", "start", "-n", "2", "-c", "sports", "--wait"])
        .passes();

    warden
        .cw()
        .args(&["crawl", "status"])
        .passes()
        .stdout_has("Status: completed")
        .stdout_has("Target: 2 item(s), category 'sports'")
        .stdout_has("Saved: 2/2 (100%)")
        .stdout_has("Outcome: crawl completed: 2 item(s) saved")
        .stdout_has("[OK] 저장: item 2");
}

#[test]
fn status_lines_limits_log_tail() {
    let warden = Warden::with_worker(QUICK_WORKER);
    warden
        .cw()
        .args(&["crawl", "start", "-n", "5", "--wait"])
        .passes();

    let run = warden
        .cw()
        .args(&["crawl", "status", "-n", "1"])
        .passes()
        .stdout_has("Logs (1 of ")
        .stdout_has("crawl completed: 5 item(s) saved");
    assert!(!run.stdout().contains("item 1\n"));

    let job = warden
        .cw()
        .args(&["crawl", "status", "-n", "2", "-o", "json"])
        .passes()
        .json();
    assert_eq!(job["logs"].as_array().unwrap().len(), 2);
}

#[test]
fn progress_tracks_saved_items() {
    let warden = Warden::with_worker(
        r#"
echo "[OK] 저장: a"
echo "[OK] 저장: b"
exit 0
"#,
    );
    warden
        .cw()
        .args(&["crawl", "start", "-n", "4", "--wait"])
        .passes();

    let job = warden.crawl_json();
    assert_eq!(job["saved_count"], 2);
    assert_eq!(job["progress_percent"], 50);
}
