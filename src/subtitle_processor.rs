use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context};
use log::debug;

use crate::errors::SubtitleError;

// @module: SRT parsing, formatting and the parsed subtitle model

// @const: One or more blank lines between blocks
static BLOCK_SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\s*\n").unwrap()
});

// @const: Markup tags such as <i> or <font color="...">
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").unwrap()
});

// @const: Widest hour field accepted in a timestamp
const MAX_HOUR_DIGITS: usize = 6;

// @struct: Single parsed subtitle
#[derive(Debug, Clone, PartialEq)]
pub struct Subtitle {
    // @field: Index line as written in the file
    pub index: usize,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Subtitle text, lines separated by '\n'
    pub text: String,
}

impl Subtitle {
    /// Creates a new subtitle
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Subtitle {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    /// Display duration in seconds. Negative when the file has end before start.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Visible character count, markup tags excluded
    pub fn chars(&self) -> usize {
        TAG_REGEX.replace_all(&self.text, "").chars().count()
    }

    /// Text lines as displayed on screen
    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to fractional seconds.
    /// Minutes and seconds must be two digits below 60 and milliseconds exactly three digits.
    pub fn parse_timestamp(timestamp: &str) -> Option<f64> {
        let (clock, millis) = timestamp.trim().split_once(',')?;

        let mut parts = clock.split(':');
        let hours = parse_digits(parts.next()?, 1, MAX_HOUR_DIGITS)?;
        let minutes = parse_digits(parts.next()?, 2, 2).filter(|m| *m < 60)?;
        let seconds = parse_digits(parts.next()?, 2, 2).filter(|s| *s < 60)?;
        if parts.next().is_some() {
            return None;
        }
        let millis = parse_digits(millis, 3, 3)?;

        let total_seconds = hours
            .checked_mul(3600)?
            .checked_add(minutes * 60)?
            .checked_add(seconds)?;

        Some(total_seconds as f64 + millis as f64 / 1000.0)
    }

    /// Format seconds as an SRT timestamp (HH:MM:SS,mmm), rounded to the millisecond.
    /// Negative and NaN inputs clamp to zero.
    pub fn format_timestamp(seconds: f64) -> String {
        let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let secs = (total_ms % 60_000) / 1_000;
        let millis = total_ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end)
    }
}

impl fmt::Display for Subtitle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)
    }
}

/// Parse SRT content into subtitles.
///
/// Fails on the first malformed block; nothing is returned for a partially
/// valid file. Empty content parses to an empty track.
pub fn parse_srt_string(content: &str) -> Result<Vec<Subtitle>, SubtitleError> {
    let normalized = content.replace("\r\n", "\n");
    let trimmed = normalized.trim();

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let subtitles = BLOCK_SEPARATOR_REGEX
        .split(trimmed)
        .enumerate()
        .map(|(i, block)| parse_block(i + 1, block))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Parsed {} subtitle blocks", subtitles.len());

    Ok(subtitles)
}

fn parse_block(block_number: usize, block: &str) -> Result<Subtitle, SubtitleError> {
    let lines: Vec<&str> = block.lines().collect();

    let index_line = lines.first().map(|l| l.trim()).unwrap_or_default();
    let index = parse_digits(index_line, 1, 20)
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i > 0)
        .ok_or_else(|| SubtitleError::InvalidIndex {
            block: block_number,
            value: index_line.to_string(),
        })?;

    let timing_line = lines
        .get(1)
        .map(|l| l.trim())
        .ok_or(SubtitleError::MissingTimingLine { block: block_number })?;

    let (start_str, end_str) = timing_line
        .split_once("-->")
        .filter(|(_, end)| !end.contains("-->"))
        .ok_or_else(|| SubtitleError::InvalidTimeRange {
            block: block_number,
            value: timing_line.to_string(),
        })?;

    let start = Subtitle::parse_timestamp(start_str).ok_or_else(|| SubtitleError::InvalidTimestamp {
        block: block_number,
        value: start_str.trim().to_string(),
    })?;
    let end = Subtitle::parse_timestamp(end_str).ok_or_else(|| SubtitleError::InvalidTimestamp {
        block: block_number,
        value: end_str.trim().to_string(),
    })?;

    let text = lines.get(2..).map(|rest| rest.join("\n")).unwrap_or_default();

    Ok(Subtitle::new(index, start, end, text))
}

/// Parse a field made only of ASCII digits, `min_len..=max_len` of them
fn parse_digits(field: &str, min_len: usize, max_len: usize) -> Option<u64> {
    if field.len() < min_len || field.len() > max_len || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Render subtitles back to SRT text, blocks separated by a blank line
pub fn to_srt_string(subtitles: &[Subtitle]) -> String {
    subtitles
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A subtitle file loaded from disk
#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    /// Source filename
    pub source_file: PathBuf,

    /// Parsed subtitles in file order
    pub subtitles: Vec<Subtitle>,
}

impl SubtitleTrack {
    /// Read and parse an SRT file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

        let subtitles = parse_srt_string(&content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))?;

        Ok(SubtitleTrack {
            source_file: path.to_path_buf(),
            subtitles,
        })
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        write!(file, "{}", to_srt_string(&self.subtitles))?;

        Ok(())
    }
}

impl fmt::Display for SubtitleTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Track")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Subtitles: {}", self.subtitles.len())?;
        Ok(())
    }
}
