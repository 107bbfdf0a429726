// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::outcome::WorkerExit;

const T0: u64 = 1_700_000_000_000;

fn running_record() -> JobRecord {
    let mut record = JobRecord::new();
    record.begin(JobId::new("job-1"), 5, Some("shoes".into()), T0);
    record
}

#[test]
fn new_record_is_idle_and_empty() {
    let record = JobRecord::new();
    assert_eq!(record.status, JobStatus::Idle);
    assert!(record.logs.is_empty());
    assert_eq!(record.logs.capacity(), crate::MAX_LOG_LINES);
    assert!(record.started_at_ms.is_none());
}

#[test]
fn begin_resets_previous_job() {
    let mut record = running_record();
    record.saved_count = 3;
    record.log(T0, "old line");
    record.bump_metric("skipped", 2);
    record.finish(JobOutcome::Succeeded, T0 + 10);

    record.begin(JobId::new("job-2"), 7, None, T0 + 20);

    assert_eq!(record.status, JobStatus::Running);
    assert_eq!(record.saved_count, 0);
    assert!(record.logs.is_empty());
    assert!(record.metrics.is_empty());
    assert!(record.outcome.is_none());
    assert!(record.ended_at_ms.is_none());
    assert_eq!(record.started_at_ms, Some(T0 + 20));
    assert!(record.is_current(&JobId::new("job-2")));
    assert!(!record.is_current(&JobId::new("job-1")));
}

#[yare::parameterized(
    empty      = { Some(""),      None },
    blank      = { Some("   "),   None },
    none       = { None,          None },
    passthrough = { Some("남성 > 가방"), Some("남성 > 가방") },
)]
fn begin_normalizes_category(input: Option<&str>, expected: Option<&str>) {
    let mut record = JobRecord::new();
    record.begin(JobId::new("j"), 1, input.map(String::from), T0);
    assert_eq!(record.category_filter.as_deref(), expected);
}

#[test]
fn request_stop_only_from_running() {
    let mut record = running_record();
    assert!(record.request_stop());
    assert_eq!(record.status, JobStatus::Stopping);
    assert!(record.stop_requested);
    assert!(!record.request_stop());

    let mut idle = JobRecord::new();
    assert!(!idle.request_stop());
    assert_eq!(idle.status, JobStatus::Idle);
}

#[test]
fn finish_sets_terminal_state_and_summary() {
    let mut record = running_record();
    record.saved_count = 2;
    assert!(record.finish(
        JobOutcome::from_exit(WorkerExit::Code { code: 0 }, false),
        T0 + 5_000
    ));

    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.ended_at_ms, Some(T0 + 5_000));
    let last = record.logs.last().unwrap();
    assert!(last.ends_with("crawl completed: 2 item(s) saved"), "got: {last}");
}

#[test]
fn failure_summary_is_tagged_error() {
    let mut record = running_record();
    record.finish(
        JobOutcome::from_exit(WorkerExit::Code { code: 1 }, false),
        T0,
    );
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record.logs.last().unwrap().contains("[ERROR]"));
}

#[test]
fn finish_is_ignored_once_terminal() {
    let mut record = running_record();
    record.finish(JobOutcome::Succeeded, T0 + 1);
    let before = record.clone();

    let applied = record.finish(
        JobOutcome::SpawnError {
            message: "late".into(),
        },
        T0 + 2,
    );

    assert!(!applied);
    assert_eq!(record, before);
}

#[test]
fn reset_returns_to_idle() {
    let mut record = running_record();
    record.log(T0, "something");
    record.finish(JobOutcome::Succeeded, T0 + 1);
    record.reset();
    assert_eq!(record, JobRecord::new());
}

#[yare::parameterized(
    no_target   = { 0, 5, 0 },
    none_saved  = { 20, 0, 0 },
    partial     = { 3, 1, 33 },
    rounds_up   = { 3, 2, 67 },
    complete    = { 5, 5, 100 },
    overshoot   = { 5, 9, 100 },
)]
fn progress(target: u32, saved: u64, expected: u8) {
    let mut record = JobRecord::new();
    record.target_count = target;
    record.saved_count = saved;
    assert_eq!(record.progress_percent(), expected);
}

#[test]
fn snapshot_reflects_record() {
    let mut record = running_record();
    record.saved_count = 1;
    record.log(T0, "hello");
    record.set_metric("candidates", 120);

    let snap = record.snapshot();
    assert!(snap.is_running);
    assert_eq!(snap.status, JobStatus::Running);
    assert_eq!(snap.target_count, 5);
    assert_eq!(snap.category_filter.as_deref(), Some("shoes"));
    assert_eq!(snap.progress_percent, 20);
    assert_eq!(snap.logs.len(), 1);
    assert_eq!(snap.metrics.get("candidates"), Some(&120));
}

#[test]
fn snapshot_json_shape() {
    let snap = running_record().snapshot();
    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["status"], "running");
    assert_eq!(json["is_running"], true);
    assert_eq!(json["job_id"], "job-1");
    assert!(json["ended_at_ms"].is_null());
    assert!(json.get("outcome").is_none());

    let back: JobSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(back, snap);
}

#[test]
fn status_predicates() {
    assert!(JobStatus::Running.is_active());
    assert!(JobStatus::Stopping.is_active());
    assert!(!JobStatus::Idle.is_active());
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(!JobStatus::Stopping.is_terminal());
    assert_eq!(JobStatus::Stopping.to_string(), "stopping");
}
