/*!
 * Tests for application configuration
 */

use anyhow::Result;
use subclean::app_config::{Config, LogLevel};
use subclean::normalizer::StageOrder;
use crate::common;

/// Test that a missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefault() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.normalizer.max_segment_duration_sec, 10.0);

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.qc.rules_path, config.qc.rules_path);
    assert_eq!(reloaded.media.ffmpeg_path, "ffmpeg");
    Ok(())
}

/// Test that partial files keep defaults for everything they omit
#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{ "normalizer": { "max_segment_duration_sec": 6.5 }, "log_level": "debug" }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.normalizer.max_segment_duration_sec, 6.5);
    assert_eq!(config.normalizer.stage_order, StageOrder::SplitThenValidate);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.media.timeout_secs, 600);
    Ok(())
}

/// Test that a malformed file is an error rather than silently replaced
#[test]
fn test_loadOrCreate_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    let result = Config::load_or_create(&path);

    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

/// Test that save then load preserves changed values
#[test]
fn test_save_thenLoad_shouldPreserveValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = common::config_in(temp_dir.path());
    config.normalizer.stage_order = StageOrder::ValidateThenSplit;
    config.media.clip_margin_sec = 0.25;
    config.save(&path)?;

    let loaded = Config::load_or_create(&path)?;

    assert_eq!(loaded.normalizer.stage_order, StageOrder::ValidateThenSplit);
    assert_eq!(loaded.media.clip_margin_sec, 0.25);
    assert_eq!(loaded.storage.database_path, config.storage.database_path);
    Ok(())
}

/// Test the validation rules
#[test]
fn test_validate_withBadValues_shouldFail() {
    let mut config = Config::default();
    config.normalizer.max_segment_duration_sec = 0.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.media.timeout_secs = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.media.clip_margin_sec = -1.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.qc.rules_path = "  ".to_string();
    assert!(config.validate().is_err());

    assert!(Config::default().validate().is_ok());
}

/// Test that an explicit database path wins over the data directory
#[test]
fn test_resolveDatabasePath_withExplicitPath_shouldUseIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::config_in(temp_dir.path());

    assert_eq!(
        config.storage.resolve_database_path(),
        temp_dir.path().join("subtitles.db")
    );
    Ok(())
}
