// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI integration tests.
//!
//! These tests run the actual cyberrec binary against a freshly written
//! record file and verify its output.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use cyberrec::{CodecTable, MessageSink, RawCodec, RecordConfig, RecordWriter, SinkMap};

/// Get a temporary directory for test files
fn temp_dir() -> PathBuf {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let thread_id = format!("{:?}", std::thread::current().id());
    std::env::temp_dir().join(format!(
        "cyberrec_cli_test_{}_{}_{}",
        std::process::id(),
        thread_id,
        random
    ))
}

/// Cleanup guard for test temporary files
#[derive(Debug)]
struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Write a small two-channel recording
fn sample_record() -> (PathBuf, CleanupGuard) {
    let dir = temp_dir();
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("sample.record");

    let codecs = CodecTable::new()
        .with("/chatter", RawCodec::new("demo.String"))
        .with("/imu", RawCodec::new("demo.Imu"));
    let mut messages = SinkMap::new();
    let mut chatter = MessageSink::ordered();
    chatter.store(1_000_000_000, b"hello".to_vec());
    chatter.store(2_000_000_000, b"world".to_vec());
    let mut imu = MessageSink::ordered();
    imu.store(1_500_000_000, vec![0xAB; 32]);
    messages.insert("/chatter".to_string(), chatter);
    messages.insert("/imu".to_string(), imu);

    RecordWriter::new(RecordConfig::unbounded())
        .write_all(&path, &messages, &codecs)
        .unwrap();
    (path, CleanupGuard(dir))
}

/// Run cyberrec with arguments
fn run(args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_cyberrec");
    Command::new(bin)
        .args(args)
        .output()
        .unwrap_or_else(|_| panic!("Failed to run {:?}", bin))
}

/// Run cyberrec and assert success
fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "Command failed: {:?}\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

// ============================================================================
// Inspect Tests
// ============================================================================

#[test]
fn test_inspect_info() {
    let (path, _guard) = sample_record();
    let stdout = run_ok(&["inspect", "info", path.to_str().unwrap()]);
    assert!(stdout.contains("Version: 1.0"));
    assert!(stdout.contains("Complete: true"));
    assert!(stdout.contains("Messages: 3"));
    assert!(stdout.contains("/imu | demo.Imu | 1 messages"));
}

#[test]
fn test_inspect_info_json() {
    let (path, _guard) = sample_record();
    let stdout = run_ok(&["inspect", "info", path.to_str().unwrap(), "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["message_count"], 3);
    assert_eq!(value["channels"].as_array().unwrap().len(), 2);
    assert_eq!(value["begin_time"], 1_000_000_000u64);
}

#[test]
fn test_inspect_channels() {
    let (path, _guard) = sample_record();
    let stdout = run_ok(&["inspect", "channels", path.to_str().unwrap(), "--counts"]);
    assert!(stdout.contains("Channel: /chatter"));
    assert!(stdout.contains("Messages: 2"));

    let filtered = run_ok(&[
        "inspect",
        "channels",
        path.to_str().unwrap(),
        "--filter",
        "imu",
    ]);
    assert!(filtered.contains("/imu"));
    assert!(!filtered.contains("/chatter"));
}

#[test]
fn test_inspect_chunks() {
    let (path, _guard) = sample_record();
    let stdout = run_ok(&["inspect", "chunks", path.to_str().unwrap()]);
    assert!(stdout.contains("[0] @"));
    assert!(stdout.contains("3 messages"));
}

#[test]
fn test_inspect_messages() {
    let (path, _guard) = sample_record();
    let stdout = run_ok(&["inspect", "messages", path.to_str().unwrap()]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("/chatter") && lines[0].contains("68656c6c6f"));
    assert!(lines[1].contains("/imu") && lines[1].ends_with(".."));

    let one = run_ok(&[
        "inspect",
        "messages",
        path.to_str().unwrap(),
        "--channel",
        "/chatter",
        "--limit",
        "1",
    ]);
    assert_eq!(one.lines().count(), 1);

    let late = run_ok(&["inspect", "messages", path.to_str().unwrap(), "--start", "2"]);
    assert_eq!(late.lines().count(), 1);
    assert!(late.contains("776f726c64"));
}

#[test]
fn test_inspect_missing_file_fails() {
    let output = run(&["inspect", "info", "/nonexistent/missing.record"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
}
