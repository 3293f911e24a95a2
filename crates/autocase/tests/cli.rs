use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, value.to_string()).expect("write fixture");
}

fn users_file(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("users.json");
    write_json(
        &path,
        &json!({ "name": "Users", "items": [{ "name": "admin", "type": "string", "value": "root" }] }),
    );
    path
}

#[test]
fn test_ping_command() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("autocase")?;
    cmd.arg("--ping");
    cmd.assert().success().stdout(predicate::str::contains("pong"));
    Ok(())
}

#[test]
fn test_resolve_substitutes_and_reports() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let data = users_file(dir.path());

    let mut cmd = Command::cargo_bin("autocase")?;
    cmd.args(["resolve", "--data"]).arg(&data).arg("login as ${Users.admin} via ${Net.proxy}");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("login as root via ${Net.proxy}"))
        .stderr(predicate::str::contains("Unresolved reference: ${Net.proxy}"));
    Ok(())
}

#[test]
fn test_plugins_list_empty_directory() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut cmd = Command::cargo_bin("autocase")?;
    cmd.args(["plugins", "list", "--dir"]).arg(dir.path());
    cmd.assert().success().stdout(predicate::str::contains("No plugins loaded."));
    Ok(())
}

#[test]
fn test_run_with_unknown_plugin_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let cases = dir.path().join("cases.json");
    write_json(
        &cases,
        &json!([{ "id": 1, "name": "smoke", "steps": [
            { "id": 1, "plugin_name": "Win32Plugin", "action": "click", "target": "ok" }
        ]}]),
    );

    let mut cmd = Command::cargo_bin("autocase")?;
    cmd.args(["run", "--cases"]).arg(&cases).arg("--plugins").arg(dir.path());
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("[FAIL] smoke"))
        .stdout(predicate::str::contains("Plugin not found: Win32Plugin"))
        .stdout(predicate::str::contains("0 passed, 1 failed"));
    Ok(())
}

#[test]
fn test_run_json_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let cases = dir.path().join("cases.json");
    write_json(
        &cases,
        &json!({ "id": 4, "name": "typed", "steps": [
            { "id": 1, "plugin_name": "web", "action": "input", "target": "user", "value": "${Users.admin}" }
        ]}),
    );
    let data = users_file(dir.path());

    let mut cmd = Command::cargo_bin("autocase")?;
    cmd.args(["run", "--json", "--cases"])
        .arg(&cases)
        .arg("--plugins")
        .arg(dir.path())
        .arg("--data")
        .arg(&data);
    let output = cmd.output()?;

    assert_eq!(output.status.code(), Some(1));
    let results: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(results[0]["case_name"], "typed");
    assert_eq!(results[0]["overall_success"], false);
    assert_eq!(results[0]["step_results"][0]["result"]["error_code"], -1);
    Ok(())
}

#[test]
fn test_run_empty_case_file_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let cases = dir.path().join("cases.json");
    std::fs::write(&cases, "[]")?;

    let mut cmd = Command::cargo_bin("autocase")?;
    cmd.args(["run", "--cases"]).arg(&cases).arg("--plugins").arg(dir.path());
    cmd.assert().success().stdout(predicate::str::contains("0 passed, 0 failed"));
    Ok(())
}

#[test]
fn test_run_reports_configuration_errors() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let cases = dir.path().join("cases.json");
    std::fs::write(&cases, "[]")?;
    let config = dir.path().join("autocase.json");
    std::fs::write(&config, r#"{"dispatch_key": "sideways"}"#)?;

    let mut cmd = Command::cargo_bin("autocase")?;
    cmd.args(["run", "--cases"]).arg(&cases).arg("--config").arg(&config);
    cmd.assert().code(2).stderr(predicate::str::contains("Configuration error"));

    let mut cmd = Command::cargo_bin("autocase")?;
    cmd.args(["run", "--cases"]).arg(dir.path().join("missing.json")).arg("--plugins").arg(dir.path());
    cmd.assert().code(2).stderr(predicate::str::contains("missing.json"));
    Ok(())
}

#[test]
fn test_invalid_dispatch_key_flag_is_a_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("autocase")?;
    cmd.args(["run", "--cases", "x.json", "--dispatch-key", "sideways"]);
    cmd.assert().failure().stderr(predicate::str::contains("unknown dispatch key"));
    Ok(())
}
