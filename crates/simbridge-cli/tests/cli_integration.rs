//! End-to-end tests driving the `simbridge` binary against the embedded
//! development stub of the engine.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DEVELOPER_DIR: &str = "/opt/xcode/Contents/Developer";

struct Workspace {
    _dir: TempDir,
    work: PathBuf,
    out: PathBuf,
    xml: PathBuf,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap();
    let work = dir.path().join("work");
    let out = dir.path().join("out");
    let xml = dir.path().join("report.xml");
    Workspace {
        work,
        out,
        xml,
        _dir: dir,
    }
}

/// A command with a hermetic environment: toolchain resolution pinned via
/// DEVELOPER_DIR, framework-supplied variables cleared.
fn simbridge() -> Command {
    let mut cmd = Command::cargo_bin("simbridge").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("XML_OUTPUT_FILE")
        .env_remove("TEST_UNDECLARED_OUTPUTS_DIR")
        .env_remove("PARSIM_STUB_EXIT")
        .env("DEVELOPER_DIR", DEVELOPER_DIR);
    cmd
}

fn base_args(ws: &Workspace) -> Vec<String> {
    vec![
        "--app_under_test_path".to_string(),
        "/A.app".to_string(),
        "--test_bundle_path".to_string(),
        "/B.xctest".to_string(),
        "--work_dir".to_string(),
        ws.work.display().to_string(),
        "--output_dir".to_string(),
        ws.out.display().to_string(),
        "--xml_output_file".to_string(),
        ws.xml.display().to_string(),
    ]
}

/// Extract the JSON config the stub echoed back.
fn stub_config(stdout: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .find_map(|line| line.strip_prefix("parsim stub config: "))
        .expect("stub did not echo its config");
    serde_json::from_str(line).expect("stub config is not valid JSON")
}

fn write_launch_options(dir: &Path) -> PathBuf {
    let path = dir.join("launch_options.json");
    std::fs::write(&path, r#"{"env_vars": {"FOO": "1"}, "tests_to_run": ["T1"]}"#).unwrap();
    path
}

#[test]
fn help_exits_zero() {
    Command::cargo_bin("simbridge")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("simbridge"));
}

#[test]
fn missing_required_argument_is_a_usage_error() {
    let mut cmd = simbridge();
    cmd.arg("simulator_test")
        .assert()
        .code(64)
        .stderr(predicate::str::contains("--app_under_test_path"));
}

#[test]
fn full_run_relocates_artifacts_and_passes_config_through() {
    let ws = workspace();
    let launch = write_launch_options(ws._dir.path());

    let assert = simbridge()
        .args(base_args(&ws))
        .args(["--launch_options_json_path", launch.to_str().unwrap()])
        .args(["simulator_test", "--device_type", "iPhone 6", "--os_version", "12.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("parsim stub starting"))
        .stdout(predicate::str::contains("parsim stub done"));

    let config = stub_config(&assert.get_output().stdout);
    assert_eq!(config["device"], "iPhone 6");
    assert_eq!(config["runtime"], "iOS 12.1");
    assert_eq!(config["app"], "/A.app");
    assert_eq!(config["test-bundle-path"], "/B.xctest");
    assert_eq!(config["xcode-path"], DEVELOPER_DIR);
    assert_eq!(config["environmentVariables"]["FOO"], "1");
    assert_eq!(config["include"][0], "T1");

    // Canonical report lands at the declared XML path and in the outputs dir.
    assert!(ws.xml.is_file());
    assert!(ws.out.join("stub_FINAL.xml").is_file());
    // The stats file is relocated under the canonical profiling name.
    let profile = std::fs::read_to_string(ws.out.join("trace-profile.json")).unwrap();
    assert!(profile.contains("\"stub\""));
    // The engine's own output directory is left intact.
    assert!(ws.work.join("stub_FINAL.xml").is_file());
}

#[test]
fn engine_exit_code_is_passed_through() {
    let ws = workspace();

    simbridge()
        .env("PARSIM_STUB_EXIT", "13")
        .args(base_args(&ws))
        .arg("simulator_test")
        .assert()
        .code(13);
}

#[test]
fn output_locations_fall_back_to_framework_env_vars() {
    let ws = workspace();

    simbridge()
        .env("TEST_UNDECLARED_OUTPUTS_DIR", &ws.out)
        .env("XML_OUTPUT_FILE", &ws.xml)
        .args([
            "--app_under_test_path",
            "/A.app",
            "--test_bundle_path",
            "/B.xctest",
            "--work_dir",
            ws.work.to_str().unwrap(),
        ])
        .arg("simulator_test")
        .assert()
        .success();

    assert!(ws.xml.is_file());
    assert!(ws.out.join("stub_FINAL.xml").is_file());
}

#[test]
fn rule_config_overrides_cli_device() {
    let ws = workspace();
    let rule = ws._dir.path().join("rule.json");
    std::fs::write(&rule, r#"{"device": "iPhone X", "num-sims": 2}"#).unwrap();

    let assert = simbridge()
        .args(base_args(&ws))
        .args(["--config_json_path", rule.to_str().unwrap()])
        .args(["simulator_test", "--device_type", "iPhone 6"])
        .assert()
        .success();

    let config = stub_config(&assert.get_output().stdout);
    assert_eq!(config["device"], "iPhone X");
    assert_eq!(config["num-sims"], 2);
}

#[test]
fn missing_launch_options_file_is_a_config_error() {
    let ws = workspace();

    simbridge()
        .args(base_args(&ws))
        .args(["--launch_options_json_path", "/nonexistent/launch.json"])
        .arg("simulator_test")
        .assert()
        .code(65)
        .stderr(predicate::str::contains("config source not found"));
}

#[test]
fn verbose_retains_the_engine_config() {
    let ws = workspace();

    let assert = simbridge()
        .arg("--verbose")
        .args(base_args(&ws))
        .arg("simulator_test")
        .assert()
        .success()
        .stderr(predicate::str::contains("engine config retained at"));

    // Clean up the retained file so repeated runs do not accumulate.
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    if let Some(rest) = stderr.split("engine config retained at ").nth(1) {
        let path: String = rest
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '\u{1b}')
            .collect();
        let _ = std::fs::remove_file(path);
    }
}
