use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const AEROBICS: &str = "tests/data/aerobics.log";
const RUNNING: &str = "tests/data/running.log";
const MISSING_TYPE: &str = "tests/data/missing_type.log";

fn ambit2x() -> Command {
    Command::cargo_bin("ambit2x").unwrap()
}

#[test]
fn aerobics_log_becomes_tcx_workout() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().to_str().unwrap();

    ambit2x()
        .args(["convert", AEROBICS, "--out-dir", out_dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted: 1 of 1 logs, 4 trackpoints"))
        .stdout(predicate::str::contains("2 laps"));

    let tcx = dir.path().join("aerobics.tcx");
    let text = fs::read_to_string(&tcx).unwrap();
    assert!(text.contains(r#"<Activity Sport="workout">"#));
    assert!(text.contains("<Intensity>Resting</Intensity>"));
    assert!(text.contains("<Name>Circuit</Name>"));

    ambit2x()
        .args(["validate", tcx.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASSED"));
}

#[test]
fn running_log_becomes_gpx() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("run.gpx");

    ambit2x()
        .args(["convert", RUNNING, "-o", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 samples dropped, 1 without position left out of GPX"));

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("<?xml"));
    assert_eq!(text.matches("<trkseg>").count(), 2);
    assert_eq!(text.matches("<trkpt ").count(), 6);
    assert!(text.contains("<type>Running</type>"));

    ambit2x()
        .args(["validate", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASSED"));
}

#[test]
fn forced_format_overrides_activity_type() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().to_str().unwrap();

    ambit2x()
        .args(["convert", RUNNING, "--out-dir", out_dir, "--format", "tcx"])
        .assert()
        .success();

    let text = fs::read_to_string(dir.path().join("running.tcx")).unwrap();
    assert!(text.contains(r#"<Activity Sport="Running">"#));
}

#[test]
fn missing_activity_type_fails_once_without_output() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("missing_type.log");
    fs::copy(MISSING_TYPE, &log).unwrap();

    let assert = ambit2x().args(["convert", log.to_str().unwrap()]).assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert_eq!(stderr.matches("conversion failed").count(), 1, "stderr: {stderr}");
    assert!(stderr.contains("ActivityTypeName"), "stderr: {stderr}");

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["missing_type.log".to_string()]);
}

#[test]
fn logs_sharing_a_stem_are_refused_before_writing() {
    let dir = tempdir().unwrap();
    for sub in ["a", "b"] {
        fs::create_dir(dir.path().join(sub)).unwrap();
        fs::copy(RUNNING, dir.path().join(sub).join("run.log")).unwrap();
    }
    let out_dir = dir.path().join("out");

    ambit2x()
        .current_dir(dir.path())
        .args(["convert", "a/run.log", "b/run.log", "--out-dir", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("would both be written to"));
    assert!(!out_dir.exists());
}

#[test]
fn gps_less_log_reports_empty_gpx() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("indoor.log");
    let text = fs::read_to_string(AEROBICS).unwrap().replace(
        "<ActivityTypeName>Aerobics</ActivityTypeName>",
        "<ActivityTypeName>Indoor</ActivityTypeName>",
    );
    fs::write(&log, text).unwrap();

    ambit2x()
        .args(["convert", log.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 trackpoints, 0 samples dropped, 4 without position left out of GPX"))
        .stderr(predicate::str::contains("no positioned trackpoints"));

    let text = fs::read_to_string(dir.path().join("indoor.gpx")).unwrap();
    assert!(!text.contains("<trkpt"));
}

#[test]
fn batch_keeps_going_after_a_bad_log() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().to_str().unwrap();

    ambit2x()
        .args(["convert", AEROBICS, MISSING_TYPE, RUNNING, "--out-dir", out_dir])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Converted: 2 of 3 logs"));

    assert!(dir.path().join("aerobics.tcx").exists());
    assert!(dir.path().join("running.gpx").exists());
}

#[test]
fn out_with_several_logs_is_rejected() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("both.gpx");

    ambit2x()
        .args(["convert", AEROBICS, RUNNING, "-o", out.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--out requires a single input log"));
    assert!(!out.exists());
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().join("never");

    ambit2x()
        .args(["convert", AEROBICS, "--dry-run", "--out-dir", out_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan: 1 of 1 logs"));
    assert!(!out_dir.exists());
}

#[test]
fn interval_only_rule_still_cuts_on_interval() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().to_str().unwrap();

    ambit2x()
        .args(["convert", AEROBICS, "--out-dir", out_dir, "--lap-rule", "interval-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 laps"));
}

#[test]
fn inspect_reports_json_summary() {
    let assert = ambit2x().args(["inspect", RUNNING, "--json"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(summary["activity_type"], "Running");
    assert_eq!(summary["output_format"], "gpx");
    assert_eq!(summary["dropped_samples"], 2);
    assert_eq!(summary["kinds"]["gps-small"]["count"], 6);
    assert_eq!(summary["lap_markers"]["Interval"], 1);
}

#[test]
fn inspect_prints_table() {
    ambit2x()
        .args(["inspect", AEROBICS])
        .assert()
        .success()
        .stdout(predicate::str::contains("Aerobics"))
        .stdout(predicate::str::contains("periodic"));
}

#[test]
fn schema_lists_sample_types() {
    ambit2x()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("gps-small"))
        .stdout(predicate::str::contains("lap-info"))
        .stdout(predicate::str::contains("Aerobics"));
}

#[test]
fn validate_rejects_foreign_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.xml");
    fs::write(&path, "<?xml version=\"1.0\"?><notes/>").unwrap();

    ambit2x()
        .args(["validate", path.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAILED"));
}
