use assert_cmd::Command;
use cogsl::cogsl::testing::sample_path;
use predicates::prelude::*;

#[test]
fn prints_simple_tokens_to_stderr() {
    let mut cmd = Command::cargo_bin("cogsl").unwrap();
    cmd.arg(sample_path("000-sentences.cogsl"));

    let output_pred = predicate::str::contains("START_OF_DOC<1> @ [0:0]")
        .and(predicate::str::contains("WORD<5> @ [0:3]\nShe\n"))
        .and(predicate::str::contains("END_OF_DOC<2> @ [77:77]"));

    cmd.assert().success().stderr(output_pred);
}

#[test]
fn reads_stdin_and_prints_json() {
    let mut cmd = Command::cargo_bin("cogsl").unwrap();
    cmd.arg("--format").arg("token-json").write_stdin("go  run");

    let output_pred = predicate::str::contains(r#""kind": "whitespace""#)
        .and(predicate::str::contains(r#""text": "run""#));

    cmd.assert().success().stdout(output_pred);
}

#[test]
fn merge_policy_from_command_line() {
    let mut cmd = Command::cargo_bin("cogsl").unwrap();
    cmd.arg("--line-breaks")
        .arg("merge")
        .arg("--format")
        .arg("token-stream")
        .write_stdin("a\n\nb");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("LINE_BREAK<4> @ [1:3]"));
}

#[test]
fn reports_fatal_errors() {
    let mut cmd = Command::cargo_bin("cogsl").unwrap();
    cmd.arg(sample_path("does-not-exist.cogsl"));

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Fatal:"));
}

#[test]
fn rejects_unknown_format() {
    let mut cmd = Command::cargo_bin("cogsl").unwrap();
    cmd.arg("--format").arg("ast-tag").write_stdin("x");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}
