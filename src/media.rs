/*!
 * ffmpeg helpers: audio extraction for transcription and clip extraction
 * for stored subtitle segments.
 *
 * Argument lists are built by pure functions so they can be checked without
 * ffmpeg installed; `MediaTool` only runs them.
 */

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::app_config::MediaConfig;
use crate::database::models::SegmentMatch;
use crate::errors::MediaError;
use crate::file_utils::{FileManager, VIDEO_EXTENSIONS};

const FFMPEG: &str = "ffmpeg";

// Characters not allowed in file names on common filesystems
static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

/// Time window to cut out of a video, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    pub start: f64,
    pub end: f64,
}

impl ClipRange {
    pub fn new(start: f64, end: f64) -> Result<Self, MediaError> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            return Err(MediaError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Widen a segment by `margin` on both sides; the start never goes below zero
    pub fn with_margin(start: f64, end: f64, margin: f64) -> Result<Self, MediaError> {
        let margin = margin.max(0.0);
        Self::new((start - margin).max(0.0), end + margin)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// ffmpeg arguments for mono 16 kHz PCM WAV extraction
pub fn audio_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-vn".to_string(),
        "-acodec".to_string(),
        "pcm_s16le".to_string(),
        "-ar".to_string(),
        "16000".to_string(),
        "-ac".to_string(),
        "1".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// ffmpeg arguments for cutting `range` out of `input`, re-encoded to H.264/AAC
pub fn clip_args(input: &Path, range: &ClipRange, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-ss".to_string(),
        format!("{:.3}", range.start),
        "-t".to_string(),
        format!("{:.3}", range.duration()),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-crf".to_string(),
        "23".to_string(),
        "-preset".to_string(),
        "fast".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Output name for an extracted audio track: `<stem>_<YYYYmmdd_HHMMSS>.wav`
pub fn audio_file_name(video: &Path, timestamp: &str) -> String {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    format!("{}_{}.wav", stem, timestamp)
}

/// Descriptive, filesystem-safe name for a segment clip
pub fn clip_file_name(found: &SegmentMatch, timestamp: &str) -> String {
    let segment_id = found.segment.id;
    let track = &found.track;

    let name = match (&track.series, track.season, track.episode, &track.video_title) {
        (Some(series), Some(season), Some(episode), _) => format!(
            "{}_S{:02}E{:02}_segment_{}_{}.mp4",
            series.replace(' ', "_"),
            season,
            episode,
            segment_id,
            timestamp
        ),
        (_, _, _, Some(title)) => {
            format!("{}_segment_{}_{}.mp4", title.replace(' ', "_"), segment_id, timestamp)
        }
        _ => format!("segment_{}_{}.mp4", segment_id, timestamp),
    };

    UNSAFE_FILENAME_CHARS.replace_all(&name, "_").into_owned()
}

/// Keep only meaningful ffmpeg stderr lines, dropping the banner and stream dump
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "size=",
        "frame=",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Find the video a stored segment came from by file stem, case-insensitively
pub fn find_video_for_filename(video_folder: &Path, filename: &str) -> Result<Option<PathBuf>> {
    let wanted = match Path::new(filename).file_stem() {
        Some(stem) => stem.to_string_lossy().to_lowercase(),
        None => return Ok(None),
    };

    let videos = FileManager::find_files_with_extensions(video_folder, VIDEO_EXTENSIONS)?;

    Ok(videos.into_iter().find(|video| {
        video
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy().to_lowercase() == wanted)
    }))
}

/// Runs ffmpeg with a per-invocation timeout
#[derive(Debug, Clone)]
pub struct MediaTool {
    ffmpeg_path: String,
    timeout: Duration,
}

impl MediaTool {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.ffmpeg_path.clone(), Duration::from_secs(config.timeout_secs))
    }

    async fn run(&self, args: &[String]) -> Result<(), MediaError> {
        debug!("Running {} {}", self.ffmpeg_path, args.join(" "));

        let ffmpeg_future = Command::new(&self.ffmpeg_path).args(args).kill_on_drop(true).output();

        let output = tokio::select! {
            result = ffmpeg_future => {
                result.map_err(|e| MediaError::Spawn {
                    tool: FFMPEG.to_string(),
                    message: e.to_string(),
                })?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(MediaError::Timeout {
                    tool: FFMPEG.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr));
            error!("ffmpeg failed: {}", stderr);
            return Err(MediaError::Failed {
                tool: FFMPEG.to_string(),
                stderr,
            });
        }

        Ok(())
    }

    /// Extract a mono 16 kHz WAV from `video` into `audio_dir`
    pub async fn extract_audio(&self, video: &Path, audio_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(audio_dir)
            .with_context(|| format!("Failed to create directory: {}", audio_dir.display()))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let output = audio_dir.join(audio_file_name(video, &timestamp));

        self.run(&audio_args(video, &output))
            .await
            .with_context(|| format!("Audio extraction failed for {}", video.display()))?;

        info!("Extracted audio: {}", output.display());
        Ok(output)
    }

    /// Cut `range` out of `video` into `output`
    pub async fn extract_clip(&self, video: &Path, range: &ClipRange, output: &Path) -> Result<PathBuf> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        self.run(&clip_args(video, range, output))
            .await
            .with_context(|| format!("Clip extraction failed for {}", video.display()))?;

        info!(
            "Extracted clip {:.2}s -> {:.2}s: {}",
            range.start,
            range.end,
            output.display()
        );
        Ok(output.to_path_buf())
    }
}
