#![allow(deprecated)] // Command::cargo_bin

use assert_cmd::Command;
use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RULES_PATH: &str = "/client/v4/zones/zone123/firewall/access_rules/rules";

/// Command isolated from the developer's environment and settings files
fn qcsync(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("qcsync").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("QCSYNC_CONFIG")
        .env_remove("CLOUDFLARE_EMAIL")
        .env_remove("CLOUDFLARE_API_KEY")
        .env_remove("CLOUDFLARE_ZONE_ID")
        .env_remove("RUST_LOG");
    cmd
}

fn write_settings(dir: &Path, server: &MockServer) -> std::path::PathBuf {
    let path = dir.join("qcsync.yaml");
    let yaml = format!(
        "provider_url: \"{uri}/ips?json\"\n\
         api_base: \"{uri}/client/v4\"\n\
         timeout_secs: 5\n\
         cloudflare:\n  email: ops@example.com\n  api_key: key123\n  zone_id: zone123\n",
        uri = server.uri()
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    qcsync(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    qcsync(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("qcsync"));
}

#[test]
fn test_serve_help() {
    let dir = tempfile::tempdir().unwrap();
    qcsync(dir.path())
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--bind"));
}

#[test]
fn test_missing_credentials_fail() {
    let dir = tempfile::tempdir().unwrap();
    qcsync(dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing credential: email"));
}

#[test]
fn test_missing_credentials_fail_without_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    qcsync(dir.path())
        .env("CLOUDFLARE_EMAIL", "ops@example.com")
        .env("CLOUDFLARE_API_KEY", "key123")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CLOUDFLARE_ZONE_ID"));
}

#[test]
fn test_explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    qcsync(dir.path())
        .args(["--config", "nope.yaml", "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("qcsync.yaml"), "batch_size: [1, 2]\n").unwrap();
    qcsync(dir.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_applies_changes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ips"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["1.1.1.1"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": [],
            "result_info": {"page": 1, "total_pages": 0}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RULES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": {"id": "new1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_settings(dir.path(), &server);
    let mut cmd = qcsync(dir.path());
    let output = tokio::task::spawn_blocking(move || cmd.arg("run").output().unwrap())
        .await
        .unwrap();

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing all 1 tasks now..."))
        .stdout(predicate::str::contains("[1/1] Adding IP: 1.1.1.1... Success."))
        .stdout(predicate::str::contains("1 succeeded"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_fails_when_provider_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ips"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path(), &server);
    let mut cmd = qcsync(dir.path());
    let output = tokio::task::spawn_blocking(move || {
        cmd.arg("--config").arg(settings).arg("run").output().unwrap()
    })
    .await
    .unwrap();

    output
        .assert()
        .failure()
        .stderr(predicate::str::contains("Provider IP list unavailable"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_plan_is_read_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ips"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["1.1.1.1", "2.2.2.2"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": [{
                "id": "r1",
                "notes": "Managed by QUIC.cloud Sync Script | Added on 2023-05-05",
                "configuration": {"target": "ip", "value": "3.3.3.3"}
            }],
            "result_info": {"page": 1, "total_pages": 1}
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_settings(dir.path(), &server);
    let mut cmd = qcsync(dir.path());
    let output = tokio::task::spawn_blocking(move || cmd.arg("plan").output().unwrap())
        .await
        .unwrap();

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("- 3.3.3.3"))
        .stdout(predicate::str::contains("+ 1.1.1.1"))
        .stdout(predicate::str::contains("Plan: 2 to add, 1 to remove, 1 batches of 10"));
}
