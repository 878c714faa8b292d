//! CLI integration tests for pg-redshift-migrate.
//!
//! These tests verify command-line argument parsing, help output, and exit
//! codes for error conditions. No database or S3 connectivity is required.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the pg-redshift-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("pg-redshift-migrate").unwrap()
}

#[test]
fn test_help_shows_all_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--migrate"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--schema-only"))
        .stdout(predicate::str::contains("--drop-and-recreate"))
        .stdout(predicate::str::contains("--schemas"))
        .stdout(predicate::str::contains("--tables"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pg-redshift-migrate"));
}

#[test]
fn test_missing_config_file_fails() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_config_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source: {{}}").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_drop_and_recreate_with_dry_run_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
source:
  host: localhost
  database: app
  user: replicator
  password: secret
target:
  uri: postgres://loader:pw@cluster:5439/warehouse
storage:
  bucket: exports
  access_key_id: AKIA123
  secret_access_key: shhh
"#
    )
    .unwrap();

    cmd()
        .args([
            "--config",
            file.path().to_str().unwrap(),
            "--drop-and-recreate",
            "--dry-run",
        ])
        .assert()
        .failure();
}
