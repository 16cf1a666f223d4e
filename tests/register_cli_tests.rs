//! Integration tests for `prorata list` and `prorata next-code`
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Working directory with a prorata.toml that knows the USD rate
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("prorata.toml"),
        r#"
[status]
expiring_within_days = 30

[currency]
base = "VND"

[currency.rates]
USD = 25000
"#,
    )
    .unwrap();
    dir
}

fn list_cmd(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("prorata");
    cmd.current_dir(dir.path())
        .arg("list")
        .arg("--register")
        .arg(fixtures_dir().join("contracts.json"))
        .args(["--today", "2024-06-05"]);
    cmd
}

fn listed_codes(stdout: &[u8]) -> Vec<String> {
    let parsed: serde_json::Value = serde_json::from_slice(stdout).unwrap();
    parsed["contracts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_list_text_shows_every_contract() {
    let dir = workspace();
    let mut cmd = list_cmd(&dir);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CT-2024-0001"))
        .stdout(predicate::str::contains("CT-2024-0007"))
        .stdout(predicate::str::contains("expiring"))
        .stdout(predicate::str::contains("4 contracts, 2 in force"))
        .stdout(predicate::str::contains("1 contracts have no value yet"));
}

#[test]
fn test_list_json_statuses() {
    let dir = workspace();
    let mut cmd = list_cmd(&dir);
    cmd.args(["--format", "json"]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["format"], "prorata-register-v1");
    assert_eq!(parsed["as_of"], "2024-06-05");

    let contracts = parsed["contracts"].as_array().unwrap();
    let status_of = |code: &str| {
        contracts
            .iter()
            .find(|c| c["code"] == code)
            .map(|c| c["status"].clone())
            .unwrap()
    };
    assert_eq!(status_of("CT-2024-0001"), "expired");
    assert_eq!(status_of("CT-2024-0002"), "expiring_soon");
    assert_eq!(status_of("CT-2024-0003"), "active");
    assert_eq!(status_of("CT-2024-0007"), "pending");

    assert_eq!(parsed["summary"]["count"], 4);
    assert_eq!(parsed["summary"]["currency"], "VND");
    assert_eq!(parsed["summary"]["without_value"], 1);
}

#[test]
fn test_list_filter_by_client() {
    let dir = workspace();
    let mut cmd = list_cmd(&dir);
    cmd.args(["-f", "client=acme corp", "--format", "json"]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        listed_codes(&output.stdout),
        vec!["CT-2024-0001", "CT-2024-0003"]
    );
}

#[test]
fn test_list_filter_running_on_day() {
    let dir = workspace();
    let mut cmd = list_cmd(&dir);
    cmd.args(["-f", "on=2024-03-10", "--format", "json"]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        listed_codes(&output.stdout),
        vec!["CT-2024-0001", "CT-2024-0003"]
    );
}

#[test]
fn test_list_summary_overflow_fails_cleanly() {
    let dir = workspace();
    let register = dir.path().join("huge.json");
    std::fs::write(
        &register,
        r#"[
            {"code": "CT-1", "client": "A", "total_value": "79228162514264337593543950335"},
            {"code": "CT-2", "client": "B", "total_value": "79228162514264337593543950335"}
        ]"#,
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("prorata");
    cmd.current_dir(dir.path())
        .args(["list", "--sort", "value", "--register"])
        .arg(&register);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("overflows"));
}

#[test]
fn test_list_filters_combine() {
    let dir = workspace();
    let mut cmd = list_cmd(&dir);
    cmd.args([
        "-f",
        "status=active,expiring",
        "-f",
        "currency=usd",
        "--format",
        "json",
    ]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    assert_eq!(listed_codes(&output.stdout), vec!["CT-2024-0002"]);
}

#[test]
fn test_list_sort_by_value_descending_missing_last() {
    let dir = workspace();
    let mut cmd = list_cmd(&dir);
    cmd.args(["--sort", "value", "--desc", "--format", "json"]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        listed_codes(&output.stdout),
        vec!["CT-2024-0007", "CT-2024-0002", "CT-2024-0001", "CT-2024-0003"]
    );
}

#[test]
fn test_list_csv_header_and_rows() {
    let dir = workspace();
    let mut cmd = list_cmd(&dir);
    cmd.args(["-f", "search=migration", "--format", "csv"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with(
            "code,client,project,title,status,start_date,end_date,total_value,currency,total_man_month\n",
        ))
        .stdout(predicate::str::contains(
            "CT-2024-0002,Globex,,Data migration,expiring,2024-05-01,2024-06-20,1200,USD,2.5\n",
        ));
}

#[test]
fn test_list_invalid_filter_fails() {
    let dir = workspace();
    let mut cmd = list_cmd(&dir);
    cmd.args(["-f", "colour=red"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown filter key 'colour'"));
}

#[test]
fn test_list_without_rate_for_foreign_contract_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = list_cmd(&dir);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No exchange rate for USD"));
}

#[test]
fn test_list_missing_register_fails() {
    let dir = workspace();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("prorata");
    cmd.current_dir(dir.path())
        .args(["list", "--register", "nope.json"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Register file not found"));
}

#[test]
fn test_list_rejects_duplicate_codes() {
    let dir = workspace();
    let register = dir.path().join("dupes.json");
    std::fs::write(
        &register,
        r#"[
            {"code": "CT-1", "client": "A", "start_date": null, "end_date": null, "total_value": null, "total_man_month": null},
            {"code": "ct-1", "client": "B", "start_date": null, "end_date": null, "total_value": null, "total_man_month": null}
        ]"#,
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("prorata");
    cmd.current_dir(dir.path())
        .arg("list")
        .arg("--register")
        .arg(&register);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate contract code: ct-1"));
}

#[test]
fn test_next_code_from_register() {
    let dir = workspace();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("prorata");
    cmd.current_dir(dir.path())
        .args(["next-code", "--kind", "contract", "--year", "2024", "--register"])
        .arg(fixtures_dir().join("contracts.json"));

    cmd.assert().success().stdout("CT-2024-0008\n");
}

#[test]
fn test_next_code_new_year_starts_at_one() {
    let dir = workspace();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("prorata");
    cmd.current_dir(dir.path())
        .args(["next-code", "--kind", "contract", "--year", "2025", "--register"])
        .arg(fixtures_dir().join("contracts.json"));

    cmd.assert().success().stdout("CT-2025-0001\n");
}

#[test]
fn test_next_code_existing_and_config_prefix() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("prorata.toml"),
        "[codes]\nwidth = 3\n\n[codes.prefixes]\ninvoice = \"bill\"\n",
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("prorata");
    cmd.current_dir(dir.path()).args([
        "next-code",
        "--kind",
        "invoice",
        "--year",
        "2024",
        "--existing",
        "BILL-2024-041",
        "--existing",
        "INV-2024-900",
        "--format",
        "json",
    ]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["kind"], "invoice");
    assert_eq!(parsed["year"], 2024);
    assert_eq!(parsed["code"], "BILL-2024-042");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = workspace();
    std::fs::write(dir.path().join("prorata.toml"), "[status]\nwindow = 3\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("prorata");
    cmd.current_dir(dir.path())
        .args(["next-code", "--kind", "client", "--year", "2024"]);

    cmd.assert().failure();
}
