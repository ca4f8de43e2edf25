use assert_cmd::prelude::*;
use serde_json::Value;
use std::process::Command;

fn sharecode() -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("sharecode");
    let mut cmd = Command::new(bin);
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn catalog_lists_steps_in_detection_order() {
    let assert = sharecode()
        .args(["--output", "json", "catalog"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let value: Value = serde_json::from_str(stdout.trim()).expect("valid json");
    let ids: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 11);
    assert_eq!(ids.first(), Some(&"entry-page"));
    assert_eq!(ids.last(), Some(&"download"));
    assert_eq!(value[0]["order"].as_u64(), Some(1));
}

#[test]
fn catalog_human_output_is_numbered() {
    let assert = sharecode().arg("catalog").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.lines().next().unwrap().contains("1. entry-page"));
    assert!(stdout.contains("two-factor-code"));
}

#[test]
fn out_of_range_concurrency_is_rejected() {
    let assert = sharecode()
        .env("SHARECODE__SCHEDULER__CONCURRENCY", "0")
        .arg("catalog")
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8 output");
    assert!(stderr.contains("scheduler.concurrency"));
}

#[test]
fn run_without_credentials_fails_before_launching() {
    let assert = sharecode()
        .args(["run", "--document-type", "passport"])
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8 output");
    assert!(stderr.contains("--document-number"));
}

#[test]
fn unknown_document_types_are_rejected_by_the_parser() {
    sharecode()
        .args(["run", "--document-type", "library-card"])
        .assert()
        .failure();
}
