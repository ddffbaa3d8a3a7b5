/*!
 * Tests for engine configuration
 */

use shadowsync::app_config::Config;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoOverrides_shouldUseDocumentedDefaults() {
    let config = Config::default();

    assert_eq!(config.sync.frame_interval_ms, 33);
    assert_eq!(config.sync.idle_poll_ms, 100);
    assert!((config.sync.min_time_delta - 0.01).abs() < 1e-9);
    assert_eq!(config.sync.time_notify_interval_ms, 100);
    assert!(config.sync.word_highlighting);
    assert!(config.sync.segment_auto_advance);

    assert_eq!(config.worker.offload_threshold_bytes, 100 * 1024);
    assert_eq!(config.worker.timeout_secs, 30);

    assert!((config.shadowing.pause_factor - 1.1).abs() < 1e-9);
    assert!((config.shadowing.trigger_lead - 0.1).abs() < 1e-9);

    assert!(config.display.word_highlighting);
    assert!((config.display.playback_rate - 1.0).abs() < 1e-9);
}

/// Test default configuration validates cleanly
#[test]
fn test_validate_withDefaultConfig_shouldSucceed() {
    assert!(Config::default().validate().is_ok());
}

/// Test validation rejects broken settings
#[test]
fn test_validate_withInvalidValues_shouldFail() {
    let mut config = Config::default();
    config.sync.frame_interval_ms = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.shadowing.pause_factor = -1.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.display.visible_languages = vec!["not-a-tag".to_string()];
    assert!(config.validate().is_err());
}

/// Test save and reload round trip through a JSON file
#[test]
fn test_save_and_from_file_withTempFile_shouldRoundTrip() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.sync.frame_interval_ms = 16;
    config.display.visible_languages = vec!["en".to_string(), "ja".to_string()];
    config.save(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.sync.frame_interval_ms, 16);
    assert_eq!(loaded.display.visible_languages, vec!["en", "ja"]);
}

/// Test partial JSON files fill in defaults
#[test]
fn test_from_file_withPartialJson_shouldApplyDefaults() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dir = temp_dir.path().to_path_buf();
    let path =
        common::create_test_file(&dir, "partial.json", r#"{"sync":{"frame_interval_ms":16}}"#)
            .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.sync.frame_interval_ms, 16);
    // Unspecified sections fall back to defaults
    assert_eq!(config.sync.idle_poll_ms, 100);
    assert_eq!(config.worker.timeout_secs, 30);
}

/// Test a missing file is a load error
#[test]
fn test_from_file_withMissingFile_shouldFail() {
    assert!(Config::from_file("/nonexistent/conf.json").is_err());
}
