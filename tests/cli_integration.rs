//! CLI integration tests against the built binary.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENV_KEYS: &[&str] = &[
    "TARGET_URLS",
    "INTERVAL_SECONDS",
    "ALLOW_ONE_SECOND_INTERVAL",
    "REQUEST_TIMEOUT_MS",
    "USER_AGENT",
    "CONCURRENCY",
    "MAX_RETRIES",
    "BACKOFF_BASE_MS",
    "BACKOFF_MAX_MS",
    "MAX_BODY_BYTES",
    "RATE_LIMIT_RPS",
    "JITTER_SEED",
    "ALLOW_RETRY_ON_STATUS",
    "HEALTH_PORT",
    "PORT",
    "LOG_JSON",
    "LOG_LEVEL",
    "RUST_LOG",
];

/// The binary run from an empty directory with a clean environment.
fn keepalive(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("keepalive").unwrap();
    cmd.current_dir(dir.path());
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    keepalive(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("keepalive"));
}

#[test]
fn test_cli_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    keepalive(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("once"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_init_then_check() {
    let dir = TempDir::new().unwrap();

    keepalive(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));
    assert!(dir.path().join("keepalive.toml").exists());

    // Refuses to overwrite without --force
    keepalive(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    keepalive(&dir)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://example.com/health"))
        .stdout(predicate::str::contains("retry_statuses = \"429,5xx\""));
}

#[test]
fn test_config_check_requires_targets() {
    let dir = TempDir::new().unwrap();
    keepalive(&dir)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("targets"));
}

#[test]
fn test_config_check_rejects_short_interval() {
    let dir = TempDir::new().unwrap();
    keepalive(&dir)
        .args(["config", "check", "-t", "http://a.test", "--interval", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval"));
}

#[test]
fn test_config_check_reads_environment() {
    let dir = TempDir::new().unwrap();
    keepalive(&dir)
        .args(["config", "check"])
        .env("TARGET_URLS", "http://a.test, http://b.test")
        .env("MAX_RETRIES", "5")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://b.test"))
        .stdout(predicate::str::contains("max_retries = 5"));
}

#[test]
fn test_config_check_rejects_bad_status_list() {
    let dir = TempDir::new().unwrap();
    keepalive(&dir)
        .args(["config", "check", "-t", "http://a.test"])
        .env("ALLOW_RETRY_ON_STATUS", "teapot")
        .assert()
        .failure();
}

#[test]
fn test_once_unreachable_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    keepalive(&dir)
        .args(["once", "-t", &common::unreachable_url()])
        .env("MAX_RETRIES", "0")
        .assert()
        .failure()
        .stdout(predicate::str::contains("exhausted"));
}

#[tokio::test]
async fn test_once_healthy_target_exits_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let uri = server.uri();
    let dir = TempDir::new().unwrap();
    let mut cmd = keepalive(&dir);
    cmd.args(["once", "-t", &uri]);

    // The mock server runs on this runtime; run the binary off it
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("success"))
        .stdout(predicate::str::contains("status=204"));
}
