use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::{Value, json};
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("blescope"))
}

const ADV_AA: u32 = 0x8E89_BED6;

fn record(ts: f64, chan: u8, body: &[u8]) -> Value {
    json!({
        "ts": ts,
        "ts_epoch": ts + 1_700_000_000.0,
        "aa": ADV_AA,
        "rssi": -60,
        "chan": chan,
        "phy": "1M",
        "body": body,
    })
}

fn adv_ind_body() -> Vec<u8> {
    let mut body = vec![0x00, 8];
    body.extend_from_slice(&[0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);
    body.extend_from_slice(&[0x02, 0x01]);
    body
}

fn scan_req_body() -> Vec<u8> {
    let mut body = vec![0x03, 12];
    body.extend_from_slice(&[0x0A; 6]);
    body.extend_from_slice(&[0x0B; 6]);
    body
}

/// Minimal extended PDU: type 7, empty declared header.
fn ext_body() -> Vec<u8> {
    vec![0x07, 2, 1, 0]
}

fn write_log(dir: &TempDir, records: &[Value]) -> std::path::PathBuf {
    let path = dir.path().join("capture.jsonl");
    let mut contents = String::new();
    for record in records {
        contents.push_str(&record.to_string());
        contents.push('\n');
    }
    std::fs::write(&path, contents).expect("write capture log");
    path
}

#[test]
fn help_covers_log_decode() {
    cmd()
        .arg("log")
        .arg("decode")
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.jsonl");
    let output = temp.path().join("decoded.jsonl");

    cmd()
        .arg("log")
        .arg("decode")
        .arg(missing)
        .arg("-o")
        .arg(output)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn unsupported_extension_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("capture.txt");
    std::fs::write(&input, "{}").expect("write input");

    cmd()
        .arg("log")
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("unsupported input format"));
}

#[test]
fn stdout_outputs_one_json_line_per_record() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_log(
        &temp,
        &[
            record(1.0, 37, &adv_ind_body()),
            record(1.1, 38, &adv_ind_body()),
        ],
    );

    let assert = cmd()
        .arg("log")
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let value: Value = serde_json::from_str(line).expect("valid json");
        assert_eq!(value["pdu"], "ADV_IND");
        assert_eq!(value["adv_a"], "11:22:33:44:55:66");
    }
}

#[test]
fn output_file_written_with_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_log(&temp, &[record(1.0, 37, &adv_ind_body())]);
    let output = temp.path().join("decoded.jsonl");

    cmd()
        .arg("log")
        .arg("decode")
        .arg(input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(contains("OK: 1 records decoded"));

    let written = std::fs::read_to_string(&output).expect("read output");
    let value: Value = serde_json::from_str(written.trim()).expect("valid json");
    assert_eq!(value["pdu"], "ADV_IND");
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_log(&temp, &[record(1.0, 37, &adv_ind_body())]);
    let output = temp.path().join("decoded.jsonl");

    cmd()
        .arg("log")
        .arg("decode")
        .arg(input)
        .arg("-o")
        .arg(output)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn text_mode_prints_summaries() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_log(&temp, &[record(1.0, 37, &adv_ind_body())]);

    cmd()
        .arg("log")
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .arg("--text")
        .assert()
        .success()
        .stdout(contains("ADV_IND").and(contains("adv_a=11:22:33:44:55:66")));
}

#[test]
fn correlation_tags_the_scan_response() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_log(
        &temp,
        &[record(1.0, 6, &scan_req_body()), record(1.0003, 6, &ext_body())],
    );

    cmd()
        .arg("log")
        .arg("decode")
        .arg(&input)
        .arg("--stdout")
        .arg("--text")
        .assert()
        .success()
        .stdout(contains("AUX_SCAN_REQ").and(contains("AUX_SCAN_RSP")));

    cmd()
        .arg("log")
        .arg("decode")
        .arg(&input)
        .arg("--stdout")
        .arg("--text")
        .arg("--stateless")
        .assert()
        .success()
        .stdout(contains("AUX_ADV_IND").and(contains("AUX_SCAN_RSP").not()));
}

#[test]
fn malformed_line_reports_its_number() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("capture.jsonl");
    let mut contents = record(1.0, 37, &adv_ind_body()).to_string();
    contents.push_str("\nnot a record\n");
    std::fs::write(&input, contents).expect("write capture log");

    cmd()
        .arg("log")
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("invalid capture record on line 2").and(contains("hint:")));
}

#[test]
fn stdout_and_output_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_log(&temp, &[record(1.0, 37, &adv_ind_body())]);
    let output = temp.path().join("decoded.jsonl");

    cmd()
        .arg("log")
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .arg("-o")
        .arg(output)
        .assert()
        .failure()
        .stderr(contains("error"));
}
