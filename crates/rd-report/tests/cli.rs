use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const POSITIONS_CSV: &str = "\
ticker,name,country,sector,currency,posn_shares,market_price_local,cost_basis_local,beta,avg_daily_volume
A,Alpha Corp,USA,Technology,USD,1000,10,9,1.0,1000000
B,Beta AG,GER,Industrials,EUR,-500,20,21,-1.5,1000000
C,Gamma KK,JPN,Technology,,200,50,40,0.5,1000000
";

const FX_CSV: &str = "\
currency,to_USD
USD,1.0
EUR,1.10
JPY,0.0067
";

fn write_inputs(dir: &Path) {
    fs::write(dir.join("positions.csv"), POSITIONS_CSV).unwrap();
    fs::write(dir.join("fx.csv"), FX_CSV).unwrap();
}

fn report_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("portfolio-report").unwrap();
    cmd.current_dir(dir)
        .env_remove("RISK_REPORT_THRESHOLDS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn wrong_arity_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();

    report_cmd(dir.path())
        .arg("positions.csv")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));

    report_cmd(dir.path())
        .args(["a.csv", "b.csv", "c.csv"])
        .assert()
        .code(1);

    assert!(!dir.path().join("portfolio_risk_report.txt").exists());
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("fx.csv"), FX_CSV).unwrap();

    report_cmd(dir.path())
        .args(["missing_positions.csv", "fx.csv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not find file"))
        .stderr(predicate::str::contains("missing_positions.csv"));

    assert!(!dir.path().join("portfolio_risk_report.txt").exists());
}

#[test]
fn malformed_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    fs::write(
        dir.path().join("positions.csv"),
        "ticker,name,country,sector,currency,posn_shares,market_price_local,cost_basis_local,avg_daily_volume\n\
         A,Alpha,USA,Tech,USD,1,1,1,1\n",
    )
    .unwrap();

    report_cmd(dir.path())
        .args(["positions.csv", "fx.csv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Malformed input"))
        .stderr(predicate::str::contains("beta"));
}

#[test]
fn writes_and_prints_report() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let assert = report_cmd(dir.path())
        .args(["positions.csv", "fx.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "FACTOR NEUTRAL GLOBAL EQUITIES PORTFOLIO - DAILY RISK REPORT",
        ))
        .stdout(predicate::str::contains("$21,067.00"))
        .stdout(predicate::str::contains("-$933.00"))
        .stdout(predicate::str::contains("CRITICAL: Portfolio beta"))
        .stderr(predicate::str::contains("Report saved to: portfolio_risk_report.txt"));

    let saved = fs::read_to_string(dir.path().join("portfolio_risk_report.txt")).unwrap();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(saved, stdout);
}

#[test]
fn threshold_overrides_from_env() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let overrides = dir.path().join("thresholds.json");
    fs::write(&overrides, r#"{"beta_neutral_limit": "5.0"}"#).unwrap();

    report_cmd(dir.path())
        .env("RISK_REPORT_THRESHOLDS", &overrides)
        .args(["positions.csv", "fx.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CRITICAL: Portfolio beta").not());
}

#[test]
fn overflowing_values_fail_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    fs::write(
        dir.path().join("positions.csv"),
        "ticker,name,country,sector,currency,posn_shares,market_price_local,cost_basis_local,beta,avg_daily_volume\n\
         X,Xeno,USA,Tech,USD,1e14,1e15,1,1,100\n",
    )
    .unwrap();

    report_cmd(dir.path())
        .args(["positions.csv", "fx.csv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error generating report"))
        .stderr(predicate::str::contains("out of range"));

    assert!(!dir.path().join("portfolio_risk_report.txt").exists());
}

#[test]
fn rust_log_overrides_default_level() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    report_cmd(dir.path())
        .env("RUST_LOG", "warn")
        .args(["positions.csv", "fx.csv"])
        .assert()
        .success()
        .stderr(predicate::str::contains("INFO").not())
        .stderr(predicate::str::contains("RISK CRITICAL"));
}

#[test]
fn redirected_stderr_has_no_colour_codes() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    report_cmd(dir.path())
        .args(["positions.csv", "fx.csv"])
        .assert()
        .success()
        .stderr(predicate::str::contains("INFO"))
        .stderr(predicate::str::contains("\u{1b}[").not());
}
