use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

#[test]
fn prints_version() {
    let exe = env!("CARGO_BIN_EXE_hn-daily");
    let output = Command::new(exe)
        .arg("--version")
        .output()
        .expect("run hn-daily --version");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "stdout was: {}",
        stdout.trim()
    );
}

#[test]
fn prints_help() {
    Command::cargo_bin("hn-daily")
        .expect("locate hn-daily binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("HN-Daily"))
        .stdout(predicate::str::contains("--version"))
        .stdout(predicate::str::contains("~/.hacker_news"));
}

#[test]
fn short_flags_match_long_flags() {
    Command::cargo_bin("hn-daily")
        .expect("locate hn-daily binary")
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("q, Enter"));

    Command::cargo_bin("hn-daily")
        .expect("locate hn-daily binary")
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("HN-Daily "));
}
