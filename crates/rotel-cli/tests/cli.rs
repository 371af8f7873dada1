use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rotel"))
}

fn repo_root() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn capture(name: &str) -> std::path::PathBuf {
    repo_root()
        .join("tests")
        .join("golden")
        .join(name)
        .join("input.bin")
}

#[test]
fn help_lists_replay() {
    cmd()
        .arg("capture")
        .arg("replay")
        .arg("--help")
        .assert()
        .success();
    cmd()
        .arg("capture")
        .arg("analyse")
        .arg("--help")
        .assert()
        .failure();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.bin");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("replay")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn stdout_outputs_json_report() {
    let assert = cmd()
        .arg("capture")
        .arg("replay")
        .arg(capture("negotiation"))
        .arg("--stdout")
        .arg("--chunk-size")
        .arg("1")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value["state"]["power"], "on");
    assert_eq!(value["state"]["source"], "opt1");
    assert_eq!(value["input"]["chunks"], 99);
}

#[test]
fn report_file_is_written() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("capture")
        .arg("replay")
        .arg(capture("negotiation"))
        .arg("-o")
        .arg(&report)
        .arg("--pretty")
        .assert()
        .success()
        .stderr(contains("OK: report written"));

    let json = std::fs::read_to_string(&report).expect("report written");
    let value: Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["commands"][4], "get_power!");
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("replay")
        .arg(capture("negotiation"))
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("replay")
        .arg(capture("negotiation"))
        .arg("-o")
        .arg(report)
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn zero_chunk_size_is_rejected() {
    cmd()
        .arg("capture")
        .arg("replay")
        .arg(capture("negotiation"))
        .arg("--stdout")
        .arg("--chunk-size")
        .arg("0")
        .assert()
        .failure()
        .stderr(contains("chunk size"));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("replay")
        .arg(capture("negotiation"))
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(predicates::str::contains("OK:").not());
}

#[test]
fn list_diagnostics_outputs_ids() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("replay")
        .arg(capture("diagnostics"))
        .arg("-o")
        .arg(report)
        .arg("--list-diagnostics")
        .assert()
        .success()
        .stderr(contains("Protocol diagnostics:").and(contains("RS-UNKNOWN-SOURCE")));
}

#[test]
fn strict_fails_when_diagnostics_present() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("replay")
        .arg(capture("diagnostics"))
        .arg("-o")
        .arg(report)
        .arg("--strict")
        .assert()
        .failure()
        .stderr(contains("protocol diagnostics detected"));
}

#[test]
fn strict_passes_on_clean_capture() {
    cmd()
        .arg("capture")
        .arg("replay")
        .arg(capture("negotiation"))
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .success();
}

#[test]
fn encode_prints_wire_strings() {
    cmd()
        .args(["encode", "source", "Optical 1"])
        .assert()
        .success()
        .stdout("opt1!\n");
    cmd()
        .args(["encode", "volume", "0.42"])
        .assert()
        .success()
        .stdout("volume_42!\n");
    cmd()
        .args(["encode", "query", "power-resolved"])
        .assert()
        .success()
        .stdout("get_power!\n");
    cmd()
        .args(["encode", "power-on"])
        .assert()
        .success()
        .stdout("power_on!\n");
}

#[test]
fn encode_rejects_unknown_source_with_hint() {
    cmd()
        .args(["encode", "source", "Vinyl"])
        .assert()
        .failure()
        .stderr(contains("unknown source").and(contains("hint: known sources: Phono")));
}

#[test]
fn serial_monitor_reports_unopenable_port() {
    cmd()
        .args(["serial", "monitor", "--port", "/nonexistent/rotel-tty"])
        .assert()
        .failure()
        .stderr(contains("cannot open serial port"));
}
