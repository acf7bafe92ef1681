// CLI integration tests for the `larder` binary.
use std::process::Command;

use serde_json::Value;

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

fn larder() -> Command {
    Command::new(env!("CARGO_BIN_EXE_larder"))
}

fn write_fixture(dir: &tempfile::TempDir) -> TestResult<std::path::PathBuf> {
    let path = dir.path().join("recipes.csv");
    std::fs::write(
        &path,
        "id,recipe_cuisine,average_rating,rating_count\n\
         1,british,3,2\n\
         2,asian,4,1\n",
    )?;
    Ok(path)
}

#[test]
fn check_reports_rows_and_fields() -> TestResult<()> {
    let dir = tempfile::tempdir()?;
    let data = write_fixture(&dir)?;

    let output = larder().arg("check").arg("--data").arg(&data).output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("2 rows"));
    assert!(stdout.contains("recipe_cuisine"));
    Ok(())
}

#[test]
fn check_json_emits_a_parsable_report() -> TestResult<()> {
    let dir = tempfile::tempdir()?;
    let data = write_fixture(&dir)?;

    let output = larder()
        .arg("check")
        .arg("--data")
        .arg(&data)
        .arg("--json")
        .output()?;
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["rows"], 2);
    assert_eq!(
        report["fields"],
        serde_json::json!(["id", "recipe_cuisine", "average_rating", "rating_count"])
    );
    Ok(())
}

#[test]
fn check_missing_file_exits_with_io_code() -> TestResult<()> {
    let output = larder()
        .arg("check")
        .arg("--data")
        .arg("/definitely/not/here.csv")
        .output()?;
    assert_eq!(output.status.code(), Some(6));
    let stderr: Value = serde_json::from_slice(&output.stderr)?;
    assert_eq!(stderr["error"]["kind"], "Io");
    Ok(())
}

#[test]
fn serve_rejects_zero_per_page() -> TestResult<()> {
    let dir = tempfile::tempdir()?;
    let data = write_fixture(&dir)?;

    let output = larder()
        .arg("serve")
        .arg("--data")
        .arg(&data)
        .arg("--bind")
        .arg("127.0.0.1:0")
        .arg("--per-page")
        .arg("0")
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    let stderr: Value = serde_json::from_slice(&output.stderr)?;
    assert_eq!(stderr["error"]["kind"], "Usage");
    Ok(())
}

#[test]
fn serve_rejects_non_loopback_bind() -> TestResult<()> {
    let dir = tempfile::tempdir()?;
    let data = write_fixture(&dir)?;

    let output = larder()
        .arg("serve")
        .arg("--data")
        .arg(&data)
        .arg("--bind")
        .arg("0.0.0.0:0")
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    let stderr: Value = serde_json::from_slice(&output.stderr)?;
    assert_eq!(stderr["error"]["kind"], "Usage");
    Ok(())
}

#[test]
fn version_prints_the_package_version() -> TestResult<()> {
    let output = larder().arg("version").output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn unknown_flags_are_usage_errors() -> TestResult<()> {
    let output = larder().arg("check").arg("--nope").output()?;
    assert_eq!(output.status.code(), Some(2));
    let stderr: Value = serde_json::from_slice(&output.stderr)?;
    assert_eq!(stderr["error"]["kind"], "Usage");
    Ok(())
}
