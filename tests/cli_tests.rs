// tests/cli_tests.rs - end-to-end tests for the loq binary
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn loq() -> Command {
    Command::cargo_bin("loq").unwrap()
}

#[test]
fn test_collapse_plain_lines() {
    loq()
        .args(["collapse_nums", "--input-format", "line", "--output-format", "line"])
        .write_stdin("took 123ms\nhello world\n")
        .assert()
        .success()
        .stdout("took <N>ms\nhello world\n");
}

#[test]
fn test_collapse_jsonl_default() {
    loq()
        .arg("collapse_nums at bar")
        .write_stdin("{\"_msg\": \"1234\"}\n")
        .assert()
        .success()
        .stdout("{\"_msg\":\"1234\",\"bar\":\"\"}\n");
}

#[test]
fn test_syntax_error_rejects_query_before_reading_input() {
    loq()
        .arg("collapse_nums foo")
        .write_stdin("{\"_msg\": \"unread\"}\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot parse query"))
        .stderr(predicate::str::contains("unexpected token"))
        .stdout("");
}

#[test]
fn test_unknown_pipe_is_rejected() {
    loq()
        .arg("no_such_pipe")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown pipe"));
}

#[test]
fn test_bad_jsonl_skipped_by_default() {
    loq()
        .arg("collapse_nums")
        .write_stdin("not json\n{\"_msg\": \"77\"}\n")
        .assert()
        .success()
        .stdout("{\"_msg\":\"<N>\"}\n");
}

#[test]
fn test_bad_jsonl_fail_fast() {
    loq()
        .args(["collapse_nums", "--fail-fast"])
        .write_stdin("not json\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot parse input record"));
}

#[test]
fn test_input_output_files() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("in.jsonl");
    let output_path = dir.path().join("out.jsonl");
    fs::write(&input_path, "{\"_msg\": \"release v1.2.3\"}\n").unwrap();

    loq()
        .arg("collapse_nums")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&output_path).unwrap(),
        "{\"_msg\":\"release v<N>.<N>.<N>\"}\n"
    );
}

#[test]
fn test_stats_reported_on_stderr() {
    loq()
        .args(["collapse_nums", "--stats"])
        .write_stdin("bad line\n{\"_msg\": \"1\"}\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("\"rows_output\":1"))
        .stderr(predicate::str::contains("\"parse_errors\":1"));
}

#[test]
fn test_debug_prints_parsed_pipeline() {
    loq()
        .args(["collapse_nums   if (x:y)   at a", "--debug"])
        .write_stdin("")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "parsed pipeline: collapse_nums if (x:y) at a",
        ));
}

#[test]
fn test_missing_input_file_fails() {
    loq()
        .args(["collapse_nums", "--input", "/no/such/file.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open input file"));
}
