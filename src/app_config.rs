use anyhow::{anyhow, Context, Result};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::normalizer::{DEFAULT_MAX_SEGMENT_DURATION_SEC, StageOrder};

/// Application configuration module
/// This module handles loading, validating and saving the application
/// configuration stored in `conf.json`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Segment normalizer settings
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    /// QC settings
    #[serde(default)]
    pub qc: QcConfig,

    /// Subtitle database settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// ffmpeg and media folder settings
    #[serde(default)]
    pub media: MediaConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Normalizer configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NormalizerConfig {
    // @field: Longest cue allowed before splitting, in seconds
    #[serde(default = "default_max_segment_duration_sec")]
    pub max_segment_duration_sec: f64,

    // @field: Order of the validation and split stages
    #[serde(default)]
    pub stage_order: StageOrder,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_segment_duration_sec: default_max_segment_duration_sec(),
            stage_order: StageOrder::default(),
        }
    }
}

/// QC configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QcConfig {
    // @field: Path to the JSON rule document
    #[serde(default = "default_rules_path")]
    pub rules_path: String,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            rules_path: default_rules_path(),
        }
    }
}

/// Subtitle database configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StorageConfig {
    // @field: SQLite file; defaults to the user data directory
    #[serde(default)]
    pub database_path: Option<String>,
}

impl StorageConfig {
    /// Resolved database location
    pub fn resolve_database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("subclean")
                .join("subtitles.db"),
        }
    }
}

/// ffmpeg and media folder configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MediaConfig {
    // @field: ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    // @field: Per-invocation timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Margin added on both sides of an extracted clip
    #[serde(default = "default_clip_margin_sec")]
    pub clip_margin_sec: f64,

    #[serde(default = "default_video_folder")]
    pub video_folder: String,

    #[serde(default = "default_audio_folder")]
    pub audio_folder: String,

    #[serde(default = "default_subtitles_folder")]
    pub subtitles_folder: String,

    #[serde(default = "default_segments_folder")]
    pub segments_folder: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_timeout_secs(),
            clip_margin_sec: default_clip_margin_sec(),
            video_folder: default_video_folder(),
            audio_folder: default_audio_folder(),
            subtitles_folder: default_subtitles_folder(),
            segments_folder: default_segments_folder(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_max_segment_duration_sec() -> f64 {
    DEFAULT_MAX_SEGMENT_DURATION_SEC
}

fn default_rules_path() -> String {
    "rules.json".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_clip_margin_sec() -> f64 {
    1.0
}

fn default_video_folder() -> String {
    "media/videos".to_string()
}

fn default_audio_folder() -> String {
    "media/audios".to_string()
}

fn default_subtitles_folder() -> String {
    "media/subtitles".to_string()
}

fn default_segments_folder() -> String {
    "media/segments".to_string()
}

impl Config {
    /// Load the configuration file, writing a default one when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;

            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let max = self.normalizer.max_segment_duration_sec;
        if !max.is_finite() || max <= 0.0 {
            return Err(anyhow!(
                "normalizer.max_segment_duration_sec must be positive, got {}",
                max
            ));
        }

        if self.qc.rules_path.trim().is_empty() {
            return Err(anyhow!("qc.rules_path must not be empty"));
        }

        if self.media.ffmpeg_path.trim().is_empty() {
            return Err(anyhow!("media.ffmpeg_path must not be empty"));
        }

        if self.media.timeout_secs == 0 {
            return Err(anyhow!("media.timeout_secs must be greater than zero"));
        }

        let margin = self.media.clip_margin_sec;
        if !margin.is_finite() || margin < 0.0 {
            return Err(anyhow!("media.clip_margin_sec must not be negative, got {}", margin));
        }

        Ok(())
    }
}
