// Regression tests for the `oasm` binary.
// Requires: assert_cmd, predicates, tempfile in [dev-dependencies]

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn oasm() -> Command {
    let mut cmd = Command::cargo_bin("oasm").unwrap();
    cmd.env_remove("RUST_LOG").arg("--color").arg("never");
    cmd
}

#[test]
fn parse_prints_one_json_line() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main.oasm");
    fs::write(&file, "function main() {\n\tret\n}\n").unwrap();

    let output = oasm().arg("parse").arg(&file).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.starts_with("{\"program\":["));
    let _: serde_json::Value = serde_json::from_str(stdout.trim_end()).unwrap();
}

#[test]
fn parse_reports_miette_diagnostics_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bad.oasm");
    fs::write(&file, "byte[byte] = 1\n").unwrap();

    oasm()
        .arg("parse")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(contains("oasm::parse::reserved_word"));
}

#[test]
fn deep_nesting_is_a_diagnostic_not_a_crash() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("deep.oasm");
    let source = format!("mov rax, {}1{}\n", "(".repeat(3000), ")".repeat(3000));
    fs::write(&file, source).unwrap();

    oasm()
        .arg("parse")
        .arg(&file)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(contains("oasm::parse::nesting_too_deep"));
}

#[test]
fn parse_reads_the_path_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main.oasm");
    fs::write(&file, "nop\n").unwrap();

    oasm()
        .arg("parse")
        .arg("-")
        .write_stdin(format!("{}\n", file.display()))
        .assert()
        .success()
        .stdout(contains("{\"opcode\":[\"nop\",1,1]}"));
}

#[test]
fn parse_with_cache_writes_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main.oasm");
    let cache = dir.path().join("trees/main.json");
    fs::write(&file, "nop\n").unwrap();

    oasm()
        .arg("parse")
        .arg(&file)
        .arg("--cache")
        .arg(&cache)
        .assert()
        .success();
    assert!(fs::read_to_string(&cache).unwrap().starts_with("{\"program\":["));
}

#[test]
fn check_fails_when_any_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.oasm");
    let bad = dir.path().join("bad.oasm");
    fs::write(&good, "nop\n").unwrap();
    fs::write(&bad, "function main() {\n").unwrap();

    oasm()
        .arg("check")
        .arg(&good)
        .arg(&bad)
        .assert()
        .failure()
        .stderr(contains("ok").and(contains("oasm::parse::unexpected_end")));
}

#[test]
fn build_mirrors_the_source_tree() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let out = dir.path().join("out");
    fs::create_dir_all(src.join("kernel")).unwrap();
    fs::write(src.join("kernel/boot.oasm"), "cli\nhlt\n").unwrap();

    oasm()
        .arg("build")
        .arg(&src)
        .arg(&out)
        .assert()
        .success()
        .stderr(contains("parsed"));
    assert!(out.join("kernel/boot.json").is_file());
}

#[test]
fn keywords_lists_reserved_words() {
    oasm()
        .arg("keywords")
        .assert()
        .success()
        .stdout(contains("\nmov\n").and(contains("\nqwords\n")).and(contains("callf").not()));
}
