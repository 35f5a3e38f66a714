/*!
 * # subclean - subtitle normalization and quality control
 *
 * A Rust library for turning raw speech-to-text segments into clean SRT
 * subtitles and checking subtitle tracks against broadcast rules.
 *
 * ## Features
 *
 * - Phantom-segment filtering and splitting of oversized cues
 * - SRT parsing and rendering
 * - Data-driven QC rules for timing, reading speed and layout
 * - A SQLite subtitle library with text search
 * - ffmpeg helpers for audio extraction and segment clips
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `normalizer`: segment filtering, splitting and SRT rendering
 * - `subtitle_processor`: SRT parsing and the parsed subtitle model
 * - `qc`: rule configuration, rule checks and reports
 * - `transcription`: sources of raw segments
 * - `database`: SQLite persistence of subtitle tracks and segments
 * - `media`: ffmpeg invocation
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod normalizer;
pub mod qc;
pub mod subtitle_processor;
pub mod transcription;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ConfigError, MediaError, StorageError, SubtitleError};
pub use normalizer::{Cue, RawSegment, SegmentNormalizer, StageOrder};
pub use qc::{Issue, QcReport, RawRuleConfig, RuleConfig, RuleEngine, RuleKind};
pub use subtitle_processor::{Subtitle, SubtitleTrack, parse_srt_string, to_srt_string};
