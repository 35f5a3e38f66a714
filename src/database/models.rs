/*!
 * Database entity models.
 *
 * These structures map directly to the `subtitles` and `segments` tables.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ConfigError;
use crate::language_utils;

/// What a stored subtitle track belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    /// A standalone video
    #[default]
    Video,
    /// A music track
    Music,
    /// An episode of a series
    Series,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Music => write!(f, "music"),
            TrackKind::Series => write!(f, "series"),
        }
    }
}

impl std::str::FromStr for TrackKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "video" => Ok(TrackKind::Video),
            "music" => Ok(TrackKind::Music),
            "series" => Ok(TrackKind::Series),
            _ => Err(anyhow::anyhow!("Invalid track kind: {}", s)),
        }
    }
}

/// Descriptive metadata supplied when a track is saved
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub kind: TrackKind,
    pub video_title: Option<String>,
    pub series: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub music_title: Option<String>,
    /// Language code or name; stored as ISO 639-2/T
    pub language: String,
    /// Media file name the subtitles were produced from
    pub filename: String,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl TrackMetadata {
    pub fn video(title: &str, language: &str, filename: &str) -> Self {
        Self {
            kind: TrackKind::Video,
            video_title: Some(title.to_string()),
            language: language.to_string(),
            filename: filename.to_string(),
            ..Self::default()
        }
    }

    pub fn music(title: &str, language: &str, filename: &str) -> Self {
        Self {
            kind: TrackKind::Music,
            music_title: Some(title.to_string()),
            language: language.to_string(),
            filename: filename.to_string(),
            ..Self::default()
        }
    }

    pub fn series(series: &str, season: Option<u32>, episode: Option<u32>, language: &str, filename: &str) -> Self {
        Self {
            kind: TrackKind::Series,
            series: Some(series.to_string()),
            season,
            episode,
            language: language.to_string(),
            filename: filename.to_string(),
            ..Self::default()
        }
    }

    /// Check required fields for the kind and normalize the language tag
    pub fn validated(&self) -> Result<Self, ConfigError> {
        let mut meta = self.clone();
        meta.video_title = non_blank(&self.video_title);
        meta.series = non_blank(&self.series);
        meta.music_title = non_blank(&self.music_title);
        meta.filename = self.filename.trim().to_string();

        let missing = match meta.kind {
            TrackKind::Video if meta.video_title.is_none() => Some("video title"),
            TrackKind::Music if meta.music_title.is_none() => Some("music title"),
            TrackKind::Series if meta.series.is_none() => Some("series name"),
            _ => None,
        };
        if let Some(field) = missing {
            return Err(ConfigError::InvalidMetadata(format!(
                "{} is required for {} subtitles",
                field, meta.kind
            )));
        }

        if meta.filename.is_empty() {
            return Err(ConfigError::InvalidMetadata("filename is required".to_string()));
        }

        meta.language = language_utils::normalize_to_part2t(&self.language)
            .map_err(|_| ConfigError::InvalidLanguage(self.language.clone()))?;

        Ok(meta)
    }

    /// Human readable origin, e.g. `Dark S01E02`, a title, or `♪ Song`
    pub fn label(&self) -> String {
        if let Some(series) = &self.series {
            let mut label = series.clone();
            if let Some(season) = self.season {
                label.push_str(&format!(" S{:02}", season));
            }
            if let Some(episode) = self.episode {
                if self.season.is_none() {
                    label.push(' ');
                }
                label.push_str(&format!("E{:02}", episode));
            }
            label
        } else if let Some(title) = &self.video_title {
            title.clone()
        } else if let Some(title) = &self.music_title {
            format!("♪ {}", title)
        } else {
            "Unknown".to_string()
        }
    }
}

/// Stored subtitle track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleTrackRecord {
    /// Database ID
    pub id: i64,
    #[serde(flatten)]
    pub metadata: TrackMetadata,
    /// SHA-256 of the normalized SRT content
    pub content_hash: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// One stored cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Database ID
    pub id: i64,
    /// Track this segment belongs to
    pub subtitle_id: i64,
    /// Zero-based place in file order; this, not the index, defines sequence
    pub position: i64,
    /// Index line as written in the SRT file, repeats allowed
    pub segment_number: i64,
    /// Start in seconds
    pub time_start: f64,
    /// End in seconds
    pub time_end: f64,
    pub text: String,
}

impl SegmentRecord {
    pub fn duration(&self) -> f64 {
        self.time_end - self.time_start
    }
}

/// Segment joined with the metadata of its track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentMatch {
    pub segment: SegmentRecord,
    pub track: TrackMetadata,
}

impl fmt::Display for SegmentMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] #{} {} --> {} | {} ({}) | \"{}\"",
            self.segment.id,
            self.segment.segment_number,
            crate::subtitle_processor::Subtitle::format_timestamp(self.segment.time_start),
            crate::subtitle_processor::Subtitle::format_timestamp(self.segment.time_end),
            self.track.label(),
            self.track.language,
            self.segment.text
        )
    }
}
