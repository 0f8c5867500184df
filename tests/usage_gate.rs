use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

#[test]
fn exits_cleanly_when_already_ran_today() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let marker = dir.path().join(".hacker_news");
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    fs::write(&marker, &today).expect("write marker");

    Command::cargo_bin("hn-daily")
        .expect("locate hn-daily binary")
        .env("HN_DAILY_CONFIG", dir.path().join("config.yaml"))
        .env("HN_DAILY_GATE__MARKER_PATH", &marker)
        .env("HN_DAILY_HACKERNEWS__URL", "http://127.0.0.1:9/")
        .assert()
        .success()
        .stdout(predicate::str::contains("You already checked today"));

    assert_eq!(fs::read_to_string(&marker).expect("read marker"), today);
}

#[test]
fn fetch_failure_exits_non_zero_without_recording() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let marker = dir.path().join(".hacker_news");

    Command::cargo_bin("hn-daily")
        .expect("locate hn-daily binary")
        .env("HN_DAILY_CONFIG", dir.path().join("config.yaml"))
        .env("HN_DAILY_GATE__MARKER_PATH", &marker)
        .env("HN_DAILY_HACKERNEWS__URL", "http://127.0.0.1:9/")
        .env("HN_DAILY_HACKERNEWS__TIMEOUT", "2s")
        .assert()
        .failure()
        .stderr(predicate::str::contains("fetch front page"));

    assert!(!marker.exists());
}
