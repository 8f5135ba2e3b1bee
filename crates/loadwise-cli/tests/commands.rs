//! CLI integration tests
//!
//! Run the built `loadwise` binary against the plans in `tests/fixtures`.
//!
//! ## Exit Code Contract
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: no errors (warnings/hints/info allowed) |
//! | 1 | Failure: one or more errors, or the command could not run |
//!
//! - --strict: warnings→errors, hints→warnings
//! - --quiet: does NOT affect exit code
//! - --format json: exit codes identical to text mode

use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn loadwise() -> Command {
    Command::new(env!("CARGO_BIN_EXE_loadwise"))
}

fn run(args: &[&str]) -> Output {
    run_in(Path::new(env!("CARGO_MANIFEST_DIR")), args)
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    loadwise()
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to execute loadwise")
}

fn plan(name: &str) -> String {
    fixture(name).display().to_string()
}

fn code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// =============================================================================
// check
// =============================================================================

#[test]
fn check_clean_plan() {
    let out = run(&["check", &plan("plan.json")]);
    assert_eq!(code(&out), 0);
    assert_eq!(
        stdout(&out),
        "Website Relaunch: 3 task(s), 3 resource(s), 4 assignment(s), 2025-03-03 .. 2025-03-30\n"
    );
    assert!(stderr(&out).is_empty());
}

#[test]
fn check_toml_plan() {
    let out = run(&["check", &plan("plan.toml")]);
    assert_eq!(code(&out), 0);
    assert!(stdout(&out).contains("1 task(s), 1 resource(s), 1 assignment(s)"));
}

#[test]
fn warnings_exit_0_by_default() {
    let out = run(&["check", &plan("warnings.json")]);
    assert_eq!(code(&out), 0);

    let err = stderr(&out);
    assert!(err.contains("warning[W002]: assignment references unknown resource 'ghost'"));
    assert!(err.contains("  --> api->ghost"));
    assert!(err.contains("info[I001]"));
}

#[test]
fn strict_escalates_warnings() {
    let out = run(&["check", "--strict", &plan("warnings.json")]);
    assert_eq!(code(&out), 1);
    assert!(stderr(&out).contains("error[W002]"));
    // info is not escalated
    assert!(stderr(&out).contains("info[I001]"));
}

#[test]
fn quiet_hides_warnings_but_keeps_exit_code() {
    let out = run(&["check", "--quiet", &plan("warnings.json")]);
    assert_eq!(code(&out), 0);
    assert!(stderr(&out).is_empty());

    let out = run(&["check", "--quiet", "--strict", &plan("warnings.json")]);
    assert_eq!(code(&out), 1);
    assert!(stderr(&out).contains("error[W002]"));
    assert!(!stderr(&out).contains("I001"));
}

#[test]
fn empty_plan_fails() {
    let out = run(&["check", &plan("empty.json")]);
    assert_eq!(code(&out), 1);
    assert!(stdout(&out).is_empty());

    let err = stderr(&out);
    assert!(err.contains("warning[W003]"));
    assert!(err.contains("error[E001]"));
    assert!(err.contains("hint: add a project start/finish"));
}

#[test]
fn empty_plan_json_diagnostics() {
    let out = run(&["check", "--format", "json", &plan("empty.json")]);
    assert_eq!(code(&out), 1);

    let doc = json(&out);
    let codes: Vec<&str> = doc["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["W003", "E001"]);
    assert!(doc.get("plan").is_none());
}

#[test]
fn missing_file_is_an_error() {
    let out = run(&["check", &plan("nope.json")]);
    assert_eq!(code(&out), 1);
    assert!(stderr(&out).starts_with("error: Failed to read plan file"));
}

#[test]
fn unsupported_extension_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.yaml");
    std::fs::write(&path, "tasks: []").unwrap();

    let out = run(&["check", &path.display().to_string()]);
    assert_eq!(code(&out), 1);
    assert!(stderr(&out).contains("Unsupported plan format '.yaml'"));
}

// =============================================================================
// Analysis commands
// =============================================================================

#[test]
fn summary_percentages() {
    let out = run(&["summary", &plan("plan.json")]);
    assert_eq!(code(&out), 0);

    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("RESOURCE"));
    assert!(lines[1].starts_with("ana"));
    assert!(lines[1].contains("125.0%"));
    assert!(lines[1].ends_with("Overloaded"));
    assert!(lines[2].contains("12.5%"));
    assert!(lines[3].ends_with("Underutilized"));
}

#[test]
fn summary_hours_as_json() {
    let out = run(&["summary", "--display", "hours", "--format", "json", &plan("plan.json")]);
    assert_eq!(code(&out), 0);

    let doc = json(&out);
    assert_eq!(doc["diagnostics"], Value::Array(Vec::new()));
    assert_eq!(doc["summary"]["mode"], "hours");

    let ana = &doc["summary"]["rows"][0];
    assert_eq!(ana["resource_id"], "ana");
    assert_eq!(ana["total_hours"], 200.0);
    assert_eq!(ana["capacity_hours"], 160.0);
    assert_eq!(ana["utilization"], 1.25);
    assert_eq!(ana["status"], "overloaded");
}

#[test]
fn summary_group_filter() {
    let out = run(&["summary", "--group", "dev", "--format", "json", &plan("plan.json")]);
    assert_eq!(code(&out), 0);

    let ids: Vec<String> = json(&out)["summary"]["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["resource_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["ana", "ben"]);
}

#[test]
fn unknown_resource_filter_fails() {
    let out = run(&["summary", "--resource", "zed", &plan("plan.json")]);
    assert_eq!(code(&out), 1);
    assert!(stderr(&out).contains("unknown resource: zed"));
}

#[test]
fn reversed_range_fails() {
    let out = run(&[
        "weekly",
        "--from",
        "2025-03-20",
        "--to",
        "2025-03-10",
        &plan("plan.json"),
    ]);
    assert_eq!(code(&out), 1);
    assert!(stderr(&out).contains("invalid date range"));
}

#[test]
fn weekly_loads_for_one_resource() {
    let out = run(&["weekly", "-r", "ana", "--format", "json", &plan("plan.json")]);
    assert_eq!(code(&out), 0);

    let weeks = json(&out)["weekly"].as_array().unwrap().clone();
    assert_eq!(weeks.len(), 4);
    assert_eq!(weeks[1]["week_start"], "2025-03-10");
    assert_eq!(weeks[1]["hours"], 80.0);
    assert_eq!(weeks[1]["utilization"], 2.0);
}

#[test]
fn recommendations_rank_overload_first() {
    let out = run(&["recommend", "--format", "json", &plan("plan.json")]);
    assert_eq!(code(&out), 0);

    let recs = json(&out)["recommendations"].as_array().unwrap().clone();
    assert_eq!(recs[0]["resource_id"], "ana");
    assert_eq!(recs[0]["priority"], "high");
    assert_eq!(recs[0]["kind"], "reassign");
    assert_eq!(recs[0]["to"], "cy");
    assert_eq!(recs[0]["hours"], 40.0);
}

#[test]
fn optimize_reports_shifts() {
    let out = run(&["optimize", "--max-shift", "14", "--mode", "minimize-peaks", "--format", "json", &plan("plan.json")]);
    assert_eq!(code(&out), 0);

    let doc = json(&out);
    assert!(doc["shifts"]["suggestions"].is_array());
    assert!(doc["shifts"]["unresolved"].is_array());
    for s in doc["shifts"]["suggestions"].as_array().unwrap() {
        assert_eq!(s["resource_id"], "ana");
        assert!(s["shift_days"].as_i64().unwrap() <= 14);
    }
}

#[test]
fn replace_prefers_lowest_peak() {
    let out = run(&["replace", "--resource", "ana", "--format", "json", &plan("plan.json")]);
    assert_eq!(code(&out), 0);

    let report = &json(&out)["replacement"];
    assert_eq!(report["resource_id"], "ana");
    assert_eq!(report["suggestions"][0]["replacement_id"], "cy");
    assert_eq!(report["suggestions"][0]["task_id"], "api");
    assert_eq!(report["suggestions"][0]["peak_after"], 0.625);
}

#[test]
fn replace_not_overloaded_emits_hint() {
    let out = run(&["replace", "--resource", "ben", &plan("plan.json")]);
    assert_eq!(code(&out), 0);
    assert!(stdout(&out).contains("not overloaded"));
    assert!(stderr(&out).contains("hint[H002]"));

    // hints become warnings, not errors
    let out = run(&["replace", "--strict", "--resource", "ben", &plan("plan.json")]);
    assert_eq!(code(&out), 0);
    assert!(stderr(&out).contains("warning[H002]"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn config_thresholds_change_classification() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "[thresholds]\noverload = 1.5\nhigh_priority = 2.0\n").unwrap();

    let out = run(&[
        "summary",
        "--config",
        &config.display().to_string(),
        "--format",
        "json",
        &plan("plan.json"),
    ]);
    assert_eq!(code(&out), 0);
    assert_eq!(json(&out)["summary"]["rows"][0]["status"], "optimal");
}

#[test]
fn config_in_working_directory_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("loadwise.toml"), "[output]\nformat = \"json\"\ndisplay = \"hours\"\n").unwrap();

    let out = run_in(dir.path(), &["summary", &plan("plan.json")]);
    assert_eq!(code(&out), 0);
    assert_eq!(json(&out)["summary"]["mode"], "hours");

    // flags win over the file
    let out = run_in(dir.path(), &["summary", "--format", "text", &plan("plan.json")]);
    assert!(stdout(&out).contains("200.0h"));
}

#[test]
fn invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[thresholds]\noptimal_min = 2.0\n").unwrap();

    let out = run(&["check", "--config", &config.display().to_string(), &plan("plan.json")]);
    assert_eq!(code(&out), 1);
    assert!(stderr(&out).contains("Invalid config file"));
}
