use std::path::PathBuf;
use std::time::Duration;

use math_board::settings::{Settings, API_URL_ENV};
use serial_test::serial;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let settings = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn empty_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "  \n").unwrap();
    let settings = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn save_then_load_keeps_every_field() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let settings = Settings {
        api_url: "https://calc.example.com/".into(),
        request_timeout_secs: 5,
        materialize_delay_ms: 0,
        viewport_width: 1920,
        viewport_height: 1080,
        top_offset: 48,
        debug_logging: true,
        log_file: Some(PathBuf::from("board.log")),
    };
    settings.save(path.to_str().unwrap()).unwrap();

    let loaded = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded, settings);
    assert_eq!(loaded.request_timeout(), Duration::from_secs(5));
    assert_eq!(loaded.session_config().materialize_delay, Duration::ZERO);
}

#[test]
fn invalid_json_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(Settings::load(path.to_str().unwrap()).is_err());
}

#[test]
#[serial]
fn env_var_overrides_api_url() {
    std::env::set_var(API_URL_ENV, "http://10.0.0.2:9000");
    let settings = Settings::default().with_env_overrides();
    std::env::remove_var(API_URL_ENV);
    assert_eq!(settings.api_url, "http://10.0.0.2:9000");

    let untouched = Settings::default().with_env_overrides();
    assert_eq!(untouched.api_url, Settings::default().api_url);
}
