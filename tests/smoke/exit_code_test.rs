use std::process::{Command, Output};

use room_smoke::report::THRESHOLD_EXIT_CODE;

/// Runs the binary for one second against a port nothing listens on, so every
/// check fails. Only the given variables reach the process.
fn run_binary(extra_env: &[(&str, &str)]) -> Output {
    let workdir = std::env::temp_dir();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_room-smoke"));
    cmd.env_clear()
        .current_dir(&workdir)
        .env("SMOKE_CONFIG", "room-smoke-missing.toml")
        .env("BASE_URL_BOOKING", "http://127.0.0.1:9")
        .env("BASE_URL_AVAIL", "http://127.0.0.1:9")
        .env("SMOKE__VUS", "1")
        .env("SMOKE__DURATION_SECS", "1")
        .env("SMOKE__PAUSE_MS", "100")
        .env("SMOKE__GRACEFUL_STOP_SECS", "1")
        .env("SMOKE__REQUEST_TIMEOUT_SECS", "1")
        .env("RUST_LOG", "error");
    for (key, value) in extra_env {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to run room-smoke binary")
}

#[test]
fn test_failed_checks_without_threshold_exit_zero() {
    let output = run_binary(&[]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✗ booking 201"), "stdout: {stdout}");
}

#[test]
fn test_breached_threshold_exits_with_threshold_code() {
    let output = run_binary(&[("SMOKE__CHECKS_RATE_MIN", "0.5")]);
    assert_eq!(output.status.code(), Some(i32::from(THRESHOLD_EXIT_CODE)));
}

#[test]
fn test_invalid_config_exits_one() {
    let output = run_binary(&[("SMOKE__VUS", "0")]);
    assert_eq!(output.status.code(), Some(1));
}
