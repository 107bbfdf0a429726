// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn sequential_ids_increment() {
    let gen = SequentialIdGen::default();
    assert_eq!(gen.next(), "job-1");
    assert_eq!(gen.next(), "job-2");
}

#[test]
fn sequential_clones_share_counter() {
    let gen = SequentialIdGen::new("t");
    let other = gen.clone();
    gen.next();
    assert_eq!(other.next(), "t-2");
}

#[test]
fn uuid_ids_are_unique() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}

#[yare::parameterized(
    shorter   = { "abc",      8, "abc" },
    exact     = { "abcdefgh", 8, "abcdefgh" },
    truncated = { "abcdefghijk", 8, "abcdefgh" },
    multibyte = { "잡아이디", 2, "잡아" },
)]
fn short_id(id: &str, n: usize, expected: &str) {
    assert_eq!(JobId::new(id).short(n), expected);
}

#[test]
fn job_id_serializes_as_plain_string() {
    let json = serde_json::to_string(&JobId::new("job-7")).unwrap();
    assert_eq!(json, "\"job-7\"");
}
