//! End-to-end tests for the `tb` binary.
//!
//! Tests the full pipeline: CSV log → balance → distribute → rendered report.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn tb_binary() -> String {
    env!("CARGO_BIN_EXE_tb").to_string()
}

/// Runs `tb` with an isolated home so no user config leaks in.
fn run_tb(home: &Path, args: &[&str]) -> Output {
    Command::new(tb_binary())
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run tb")
}

const WEEK_LOG: &str = "\
ticket,estimate,day,start,end
PROJ-1,4h,Mon,09:00,12:00
PROJ-2,2h,Mon,13:00,16:30
prev,,Tue,09:00,
PROJ-3,6h,Tue,10:00,14:00
,,Tue,14:30,15:45
";

fn write_log(temp: &TempDir, contents: &str) -> String {
    let path = temp.path().join("week.csv");
    std::fs::write(&path, contents).unwrap();
    path.display().to_string()
}

fn total_of(json: &serde_json::Value, key: &str) -> i64 {
    json[key].as_i64().unwrap_or_else(|| panic!("{key} should be an integer"))
}

/// The JSON report balances the week and distributes every reported minute.
#[test]
fn test_track_json_balances_week() {
    let temp = TempDir::new().unwrap();
    let log = write_log(&temp, WEEK_LOG);

    let output = run_tb(temp.path(), &["track", &log, "--json"]);
    assert!(
        output.status.success(),
        "tb track should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["days"], serde_json::json!(["Mon", "Tue"]));
    assert_eq!(total_of(&json, "weekly_target"), 960);

    let summary = json["summary"].as_array().unwrap();
    let names: Vec<_> = summary.iter().map(|row| row["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["proj-1", "proj-2", "proj-3"]);
    for row in summary {
        assert!(row["total"].as_i64().unwrap() > 0);
    }

    let reported = json["total"]["total"].as_i64().unwrap();
    assert!(reported >= 960, "reported {reported} should reach the target");
    assert_eq!(total_of(&json, "distributed_total"), reported.min(960));
}

/// Both strategies produce a report for the same log.
#[test]
fn test_track_optimizing_strategy() {
    let temp = TempDir::new().unwrap();
    let log = write_log(&temp, WEEK_LOG);

    let output = run_tb(
        temp.path(),
        &["track", &log, "--strategy", "optimizing", "--json"],
    );
    assert!(
        output.status.success(),
        "tb track --strategy optimizing should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["total"]["total"].as_i64().unwrap() >= 960);
}

/// Human output has both tables with their total rows.
#[test]
fn test_track_human_output() {
    let temp = TempDir::new().unwrap();
    let log = write_log(&temp, WEEK_LOG);

    let output = run_tb(temp.path(), &["track", &log]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("TIME REPORT: Mon, Tue (target 16h 0m)"));
    assert!(stdout.contains("SUMMARY"));
    assert!(stdout.contains("DISTRIBUTION"));
    assert_eq!(stdout.lines().filter(|l| l.starts_with("TOTAL")).count(), 2);
}

/// Config file values change the weekly capacity.
#[test]
fn test_track_respects_config_file() {
    let temp = TempDir::new().unwrap();
    let log = write_log(&temp, WEEK_LOG);
    let config = temp.path().join("tb.toml");
    std::fs::write(&config, "day_capacity = 420\n").unwrap();

    let output = run_tb(
        temp.path(),
        &["--config", config.to_str().unwrap(), "track", &log, "--json"],
    );
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(total_of(&json, "weekly_target"), 840);
}

/// Bad log data fails with the offending ticket in the message.
#[test]
fn test_track_reports_log_errors() {
    let temp = TempDir::new().unwrap();
    let log = write_log(
        &temp,
        "ticket,estimate,day,start,end\nPROJ-1,1h,Mon,10:00,09:00\n",
    );

    let output = run_tb(temp.path(), &["track", &log]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("start time is greater than end time for ticket: proj-1"),
        "unexpected stderr: {stderr}"
    );
}

/// Invalid configuration is rejected before any work happens.
#[test]
fn test_track_rejects_invalid_config() {
    let temp = TempDir::new().unwrap();
    let log = write_log(&temp, WEEK_LOG);
    let config = temp.path().join("tb.toml");
    std::fs::write(&config, "deviation_penalty = 2.0\n").unwrap();

    let output = run_tb(
        temp.path(),
        &["--config", config.to_str().unwrap(), "track", &log],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("deviation_penalty"));
}

/// The estimate subcommand prints the PERT report.
#[test]
fn test_estimate_human_output() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("guesses.csv");
    std::fs::write(
        &path,
        "subtask,best,likely,worst\nanalysis,1:00,2:15,3:30\nimplementation,4:45,5:00,6:15\ntesting,7:30,8:45,9:00\n",
    )
    .unwrap();

    let output = run_tb(temp.path(), &["estimate", path.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("> EE: 16h 0m (sd 33m)"));
    assert!(stdout.contains("> E: 17h 6m"));
    assert!(stdout.contains("> Risk: 7%"));
}
