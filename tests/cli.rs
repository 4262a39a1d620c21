//! End-to-end tests for the tclint and tclfmt binaries.

use assert_cmd::Command;
use predicates::prelude::*;

fn tclint() -> Command {
    Command::cargo_bin("tclint").expect("binary builds")
}

fn tclfmt() -> Command {
    Command::cargo_bin("tclfmt").expect("binary builds")
}

#[test]
fn lint_clean_file_exits_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("clean.tcl");
    std::fs::write(&path, "puts hello\n").expect("write");

    tclint().arg(&path).assert().success().stdout("");
}

#[test]
fn lint_reports_violations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.tcl");
    std::fs::write(&path, "puts a b c d e\n").expect("write");

    tclint()
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("bad.tcl:1:1:"))
        .stdout(predicate::str::contains("[command-args]"));
}

#[test]
fn lint_syntax_error_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.tcl");
    std::fs::write(&path, "puts {unterminated\n").expect("write");

    tclint()
        .arg(&path)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("[syntax-error]"));
}

#[test]
fn lint_reads_stdin() {
    tclint()
        .arg("-")
        .write_stdin("proc set {} {}\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("(stdin):1:1:"))
        .stdout(predicate::str::contains("[redefined-builtin]"));
}

#[test]
fn lint_show_categories() {
    tclint()
        .arg("--show-categories")
        .arg("-")
        .write_stdin("puts  a\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[spacing] (style)"));
}

#[test]
fn lint_missing_path_is_input_error() {
    tclint().arg("no/such/file.tcl").assert().code(4);
}

#[test]
fn lint_config_ignore_rule() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("tclint.toml");
    std::fs::write(&config, "ignore = [\"spacing\"]\n").expect("write");
    let path = dir.path().join("spaced.tcl");
    std::fs::write(&path, "puts  a\n").expect("write");

    tclint().arg("-c").arg(&config).arg(&path).assert().success();
}

#[test]
fn lint_invalid_config_is_input_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("tclint.toml");
    std::fs::write(&config, "no-such-key = true\n").expect("write");

    tclint()
        .arg("-c")
        .arg(&config)
        .arg("-")
        .write_stdin("puts a\n")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn lint_walks_directories_by_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("a.tcl"), "puts a b c d e\n").expect("write");
    std::fs::write(dir.path().join("b.txt"), "puts a b c d e\n").expect("write");

    tclint()
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("a.tcl"))
        .stdout(predicate::str::contains("b.txt").not());
}

#[test]
fn lint_inline_waiver() {
    tclint()
        .arg("-")
        .write_stdin("# tclint-disable-next-line command-args\nputs a b c d e\n")
        .assert()
        .success();
}

#[test]
fn fmt_writes_formatted_output() {
    tclfmt()
        .arg("-")
        .write_stdin("set a  1\n")
        .assert()
        .success()
        .stdout("set a 1\n");
}

#[test]
fn fmt_check_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("messy.tcl");
    std::fs::write(&path, "set a  1\n").expect("write");

    tclfmt()
        .arg("--check")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("would reformat"));

    std::fs::write(&path, "set a 1\n").expect("write");
    tclfmt().arg("--check").arg(&path).assert().success();
}

#[test]
fn fmt_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("messy.tcl");
    std::fs::write(&path, "set a  1\n").expect("write");

    tclfmt().arg("--in-place").arg(&path).assert().success();
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "set a 1\n");
}

#[test]
fn fmt_refuses_syntax_errors() {
    tclfmt()
        .arg("-")
        .write_stdin("puts {unterminated\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn fmt_debug_round_trip() {
    tclfmt()
        .arg("-d")
        .arg("-")
        .write_stdin("if {$a &&\n    $b} {\n    body\n}\n")
        .assert()
        .success()
        .stdout("if {\n    $a &&\n    $b\n} {\n    body\n}\n");
}
