// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn rejected_response_keeps_code_and_message() {
    let err = unexpected(Response::Rejected {
        code: "already_running".to_string(),
        message: "a crawl job is already running".to_string(),
    });
    assert!(matches!(err, ClientError::Rejected { ref code, .. } if code == "already_running"));
    assert_eq!(err.to_string(), "a crawl job is already running");
}

#[test]
fn error_response_maps_to_daemon_error() {
    let err = unexpected(Response::Error {
        message: "boom".to_string(),
    });
    assert_eq!(err.to_string(), "Daemon error: boom");
}

#[test]
fn other_responses_are_unexpected() {
    assert!(matches!(
        unexpected(Response::Pong),
        ClientError::UnexpectedResponse
    ));
    assert!(check_ok(Response::Ok).is_ok());
    assert!(check_ok(Response::ShuttingDown).is_err());
}

#[yare::parameterized(
    not_running = { ClientError::DaemonNotRunning, true },
    refused     = { ClientError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)), true },
    missing     = { ClientError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)), true },
    denied      = { ClientError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied)), false },
    timeout     = { ClientError::DaemonStartTimeout, false },
)]
fn not_running_classification(err: ClientError, expected: bool) {
    assert_eq!(err.is_not_running(), expected);
}

#[test]
#[serial(cli_env)]
fn connect_without_socket_is_not_running() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("CW_STATE_DIR", dir.path());

    let result = DaemonClient::connect();
    std::env::remove_var("CW_STATE_DIR");

    assert!(matches!(result, Err(ClientError::DaemonNotRunning)));
    // The failure is recorded for later diagnosis
    let log = std::fs::read_to_string(dir.path().join("cli.log")).unwrap();
    assert!(log.contains("Daemon not running"));
}
