//! End-to-end tests that run the built `americano` binary
//!
//! Gated behind the `integration` feature flag. Run with:
//!
//! ```sh
//! cargo test -p americano-cli --features integration
//! ```

#![cfg(feature = "integration")]

use std::process::Command;

fn americano() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_americano"));
    // Keep a developer's project config out of the way
    let isolated = tempfile::TempDir::new().unwrap();
    cmd.env("AMERICANO_PROJECT_CONFIG_DIR", isolated.keep());
    cmd
}

#[test]
fn americano_help_lists_commands() {
    let output = americano().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("estimate"));
    assert!(stdout.contains("extract"));
    assert!(stdout.contains("config"));
}

#[test]
fn americano_config_show_prints_sections() {
    let output = americano().args(["config", "show"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[server]"));
    assert!(stdout.contains("[adaptive.stopping]"));
    assert!(stdout.contains("[resilience.retry]"));
}

#[test]
fn americano_estimate_reads_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("responses.json");
    std::fs::write(
        &path,
        r#"[
            {"difficulty": 50, "correct": true},
            {"difficulty": 60, "correct": true},
            {"difficulty": 70, "correct": false}
        ]"#,
    )
    .unwrap();

    let output = americano()
        .args(["estimate", "--json"])
        .arg(&path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["observation_count"], 3);
    assert!(status["display_theta"].is_number());
}

#[test]
fn americano_rust_log_overrides_default_level() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("responses.json");
    std::fs::write(&path, r#"[{"difficulty": 50, "correct": true}]"#).unwrap();

    let output = americano()
        .env("RUST_LOG", "americano_adaptive=debug")
        .arg("estimate")
        .arg(&path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Estimated ability"));
}

#[test]
fn americano_config_show_json() {
    let output = americano().args(["config", "show", "--json"]).output().unwrap();

    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(config["resilience"]["retry"]["max_retries"].is_number());
}

#[test]
fn americano_extract_requires_files() {
    let output = americano().arg("extract").output().unwrap();
    assert!(!output.status.success());
}
