//! Integration tests for the file log sink
//!
//! Run with:
//! ```sh
//! cargo test -p servegate-core --test test_logging
//! ```

use std::path::Path;

use servegate_core::{init_logging, Input, LimitChecker, LoggingConfig};
use tempfile::tempdir;

fn config_for(path: &Path, level: &str) -> LoggingConfig {
    LoggingConfig {
        file: path.to_path_buf(),
        level: level.to_string(),
        console: false,
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read log file")
        .lines()
        .map(str::to_string)
        .collect()
}

/// `[YYYY-MM-DD HH:MM:SS,mmm <file>:<line>] - <message>`
fn assert_line_format(line: &str, file: &str, message: &str) {
    let rest = line.strip_prefix('[').expect("line should start with '['");
    let (stamp_and_loc, msg) = rest.split_once("] - ").expect("missing '] - ' separator");
    assert_eq!(msg, message);

    let (date, rest) = stamp_and_loc.split_once(' ').expect("missing date");
    let (time, location) = rest.split_once(' ').expect("missing time");

    let date_parts: Vec<&str> = date.split('-').collect();
    assert_eq!(date_parts.len(), 3, "date: {}", date);
    assert_eq!(date_parts[0].len(), 4);
    assert!(date_parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));

    let (hms, millis) = time.split_once(',').expect("missing millisecond separator");
    assert_eq!(hms.len(), 8, "time: {}", time);
    assert_eq!(millis.len(), 3, "millis: {}", millis);
    assert!(millis.chars().all(|c| c.is_ascii_digit()));

    let (name, line_no) = location.rsplit_once(':').expect("missing line number");
    assert_eq!(name, file);
    assert!(line_no.parse::<u32>().is_ok(), "line: {}", line_no);
}

#[test]
fn test_line_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("KSERVE.log");

    let handle = init_logging(&config_for(&path, "debug")).unwrap();
    handle.in_scope(|| tracing::info!("Number of images: 2"));

    let lines = read_lines(&path);
    let last = lines.last().expect("log file should not be empty");
    assert_line_format(last, "test_logging.rs", "Number of images: 2");
}

#[test]
fn test_events_below_threshold_are_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("warn.log");

    let handle = init_logging(&config_for(&path, "warning")).unwrap();
    handle.in_scope(|| {
        tracing::debug!("debug detail");
        tracing::info!("routine info");
        tracing::warn!("disk nearly full");
        tracing::error!("decoder crashed");
    });

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 2, "{:?}", lines);
    assert!(lines[0].ends_with("] - disk nearly full"));
    assert!(lines[1].ends_with("] - decoder crashed"));
}

#[test]
fn test_setup_truncates_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("KSERVE.log");
    std::fs::write(&path, "stale line from a previous run\n").unwrap();

    let handle = init_logging(&config_for(&path, "info")).unwrap();
    handle.in_scope(|| tracing::info!("fresh start"));

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 1, "{:?}", lines);
    assert!(lines[0].ends_with("] - fresh start"));
}

#[test]
fn test_checker_logs_through_handle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checks.log");

    let handle = init_logging(&config_for(&path, "info")).unwrap();
    let checker = LimitChecker::new();
    let outcome = handle.in_scope(|| checker.check_images(&Input::from(&["a.png", "b.png"][..]), 4));
    assert!(outcome.is_pass());

    let lines = read_lines(&path);
    let line = lines
        .iter()
        .find(|l| l.ends_with("] - Number of images: 2"))
        .expect("checker should log the image count");
    assert!(line.contains(" checker.rs:"), "{}", line);
}

#[test]
fn test_handles_do_not_leak_between_scopes() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.log");
    let second = dir.path().join("second.log");

    let a = init_logging(&config_for(&first, "info")).unwrap();
    let b = init_logging(&config_for(&second, "info")).unwrap();

    a.in_scope(|| tracing::info!("to first"));
    b.in_scope(|| tracing::info!("to second"));
    tracing::info!("to nobody");

    assert_eq!(read_lines(&first).len(), 1);
    assert_eq!(read_lines(&second).len(), 1);
    assert!(read_lines(&second)[0].ends_with("] - to second"));
}
