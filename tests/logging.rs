use std::{fs, thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

// The subscriber is process-global, so both cases share one test.
#[test]
#[serial]
fn writes_log_file_and_keeps_first_subscriber() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("board.log");

    math_board::logging::init(true, Some(path.clone()));
    tracing::info!("evaluation started");

    sleep(Duration::from_millis(100));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("evaluation started"));
    assert!(!contents.contains("\u{1b}["), "file output should not carry ANSI codes");

    let other = dir.path().join("other.log");
    math_board::logging::init(false, None);
    tracing::info!("after second init");

    sleep(Duration::from_millis(100));

    assert!(!other.exists(), "log file should not be created");
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("after second init"));

    // a log file under a regular file cannot be opened; init must not panic
    let not_a_dir = dir.path().join("settings.json");
    fs::write(&not_a_dir, "{}").unwrap();
    math_board::logging::init(false, Some(not_a_dir.join("board.log")));
    tracing::info!("after unwritable init");
    assert!(not_a_dir.is_file());
}
