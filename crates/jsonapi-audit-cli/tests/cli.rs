//! End-to-end tests for the jsonapi-audit binary

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

const JSONAPI: &str = "application/vnd.api+json";

fn conforming_envelope() -> Value {
    json!({
        "httpStatus": 200,
        "headers": {"Content-Type": JSONAPI, "Vary": "Accept"},
        "parsedBody": {"data": {"type": "articles", "id": "1", "attributes": {"title": "JSON:API"}}},
        "requestUrl": "http://example.com/articles/1",
        "requestMethod": "GET"
    })
}

fn write_envelope(dir: &TempDir, name: &str, envelope: &Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(envelope).unwrap()).unwrap();
    path
}

fn audit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("jsonapi-audit").unwrap();
    cmd.current_dir(dir).env_remove("JSONAPI_AUDIT_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn conforming_exchange_exits_zero() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = write_envelope(&dir, "ok.json", &conforming_envelope());

    audit(dir.path())
        .args(["--no-color", "validate"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("GET http://example.com/articles/1 -> 200"))
        .stdout(predicate::str::contains("0 failure(s)"));
    Ok(())
}

#[test]
fn data_with_errors_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut envelope = conforming_envelope();
    envelope["parsedBody"]["errors"] = json!([{"status": "500"}]);
    let path = write_envelope(&dir, "both.json", &envelope);

    audit(dir.path())
        .args(["--no-color", "validate"])
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL Data and Errors Exclusivity"))
        .stderr(predicate::str::contains("did not conform"));
    Ok(())
}

#[test]
fn warnings_fail_only_when_asked() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut envelope = conforming_envelope();
    envelope["headers"] = json!({"Content-Type": JSONAPI});
    let path = write_envelope(&dir, "no-vary.json", &envelope);

    audit(dir.path()).args(["validate"]).arg(&path).assert().success();
    audit(dir.path())
        .args(["validate", "--fail-on-warnings"])
        .arg(&path)
        .assert()
        .code(1);
    Ok(())
}

#[test]
fn json_output_is_a_list_of_reports() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let first = write_envelope(&dir, "a.json", &conforming_envelope());
    let second = write_envelope(&dir, "b.json", &conforming_envelope());

    let assert = audit(dir.path())
        .args(["--output", "json", "validate"])
        .arg(&first)
        .arg(&second)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let reports: Value = serde_json::from_str(stdout.trim())?;
    let reports = reports.as_array().ok_or("expected an array")?;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["summary"]["failed"], 0);
    assert!(reports[0]["generatedAt"].is_string());
    Ok(())
}

#[test]
fn yaml_envelope_is_accepted() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("exchange.yaml");
    fs::write(
        &path,
        r#"
httpStatus: 204
headers:
  Vary: Accept
requestUrl: http://example.com/articles/1
requestMethod: DELETE
"#,
    )?;

    audit(dir.path()).args(["validate"]).arg(&path).assert().success();
    Ok(())
}

#[test]
fn config_file_options_apply() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let envelope = json!({
        "httpStatus": 201,
        "headers": {"Content-Type": JSONAPI, "Vary": "Accept", "Location": "http://example.com/photos/1"},
        "parsedBody": {"data": {"type": "photos", "id": "1"}},
        "requestUrl": "http://example.com/photos",
        "requestMethod": "POST",
        "requestHeaders": {"Content-Type": JSONAPI},
        "requestBody": {"data": {"type": "photos", "id": "1"}}
    });
    let path = write_envelope(&dir, "create.json", &envelope);

    audit(dir.path()).args(["validate"]).arg(&path).assert().success();

    fs::write(
        dir.path().join(".jsonapi-audit.yaml"),
        "validation:\n  clientGeneratedIds: forbidden\n",
    )?;
    audit(dir.path())
        .args(["--no-color", "validate"])
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Request Client-Generated ID"));
    Ok(())
}

#[test]
fn missing_envelope_reports_file_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    audit(dir.path())
        .args(["validate", "missing.json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("File not found"));
    Ok(())
}

#[test]
fn malformed_envelope_is_invalid_format() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = write_envelope(&dir, "bad.json", &json!({"httpStatus": 200, "requestUrl": "", "requestMethod": "GET"}));
    audit(dir.path())
        .args(["validate"])
        .arg(&path)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("requestUrl"));
    Ok(())
}

#[test]
fn config_init_then_show() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    audit(dir.path()).args(["config", "init"]).assert().success();
    assert!(dir.path().join(".jsonapi-audit.yaml").exists());

    audit(dir.path()).args(["config", "init"]).assert().code(5);

    audit(dir.path())
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"requireVaryAccept\": true"));
    Ok(())
}
