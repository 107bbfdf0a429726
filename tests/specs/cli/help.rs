//! CLI help specs

use crate::prelude::*;

#[test]
fn top_level_help_lists_commands() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["--help"])
        .passes()
        .stdout_has("crawl")
        .stdout_has("daemon");
}

#[test]
fn no_args_prints_help() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden.cw().passes().stdout_has("Usage: cw");
}

#[test]
fn crawl_start_help_documents_options() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["crawl", "start", "--help"])
        .passes()
        .stdout_has("--limit")
        .stdout_has("--category")
        .stdout_has("--wait")
        .stdout_has("[default: 20]");
}

#[test]
fn unknown_subcommand_fails() {
    let warden = Warden::with_worker(QUICK_WORKER);

    warden
        .cw()
        .args(&["crawl", "pause"])
        .fails()
        .stderr_has("unrecognized subcommand");
}
