// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end runs of the `recflow` binary: exit codes, stderr
//! diagnostics, and stdout payloads.

use std::io::Write as _;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

fn recflow(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_recflow"))
        .args(args)
        .output()
        .expect("spawn recflow")
}

fn file_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn joins_two_files_end_to_end() {
    let left = file_with("id=1,name=a\nid=2,name=b\n");
    let right = file_with("id=2,amt=20\nid=3,amt=30\n");

    let output = recflow(&[
        "join",
        "-j",
        "id",
        "--ul",
        "--ur",
        "-f",
        left.path().to_str().unwrap(),
        right.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "id=2,name=b,amt=20\nid=3,amt=30\nid=1,name=a\n"
    );
}

#[test]
fn missing_left_file_exits_one_with_diagnostic() {
    let right = file_with("id=1,amt=10\n");

    let output = recflow(&[
        "join",
        "-j",
        "id",
        "-f",
        "/no/such/left.dkvp",
        right.path().to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("/no/such/left.dkvp"));
}

#[test]
fn configuration_error_reports_before_reading_records() {
    // Mismatched -j/-l lengths must fail even with no input at all.
    let output = recflow(&["join", "-j", "id", "-l", "a,b", "-f", "/dev/null"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("equal left,right,output field-name lists"));
}

#[test]
fn many_missing_input_files_exit_one_promptly() {
    let output = recflow(&["cat", "/no/a", "/no/b", "/no/c", "/no/d"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("/no/a"));
}

#[test]
fn unknown_verb_prints_usage() {
    let output = recflow(&["frobnicate"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("usage:"));
    assert!(stderr.contains("join"));
}

#[test]
fn format_conversion_round_trips() {
    let input = file_with("id,name\n1,a\n2,b\n");

    let output = recflow(&[
        "--icsv",
        "--ojson",
        "cut",
        "-f",
        "id",
        input.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("[\n"));
    assert!(stdout.trim_end().ends_with(']'));
    assert!(stdout.contains("\"id\": 1"));
    assert!(!stdout.contains("name"));
}
