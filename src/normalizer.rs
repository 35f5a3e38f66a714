/*!
 * Segment normalization for raw speech-to-text output.
 *
 * Turns the segments produced by a transcription engine into subtitle cues:
 * - Phantom filtering (long, near-empty segments and junk tokens)
 * - Duration validation against the configured cap
 * - Splitting of oversized segments at the middle word
 * - Rendering to the SRT interchange format
 *
 * Every stage is total: odd input (end before start, empty text) is carried
 * or dropped by the rules below, never reported as an error.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::subtitle_processor::{self, Subtitle};

/// Raw segment timing is expressed in hundredths of a second
pub const TICKS_PER_SECOND: f64 = 100.0;

/// Segments longer than the cap with fewer visible characters than this are phantoms
const PHANTOM_MAX_TEXT_LEN: usize = 20;

/// Segments with fewer characters than this are noise tokens
const MIN_TEXT_LEN: usize = 3;

/// Default cap on cue duration in seconds
pub const DEFAULT_MAX_SEGMENT_DURATION_SEC: f64 = 10.0;

/// A segment as emitted by the transcription source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    /// Start in ticks
    #[serde(alias = "t0")]
    pub start: f64,
    /// End in ticks; not guaranteed to be after start
    #[serde(alias = "t1")]
    pub end: f64,
    /// Untrimmed text
    #[serde(default)]
    pub text: String,
}

impl RawSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.end - self.start) / TICKS_PER_SECOND
    }
}

/// A cleaned segment ready for rendering. Split halves use this type too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Start in ticks
    pub start: f64,
    /// End in ticks
    pub end: f64,
    /// Trimmed text
    pub text: String,
}

impl Cue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.end - self.start) / TICKS_PER_SECOND
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Whether the cue exceeds `max_duration_sec`
    pub fn is_oversized(&self, max_duration_sec: f64) -> bool {
        self.duration_seconds() > max_duration_sec
    }

    /// Convert to a numbered subtitle in seconds
    pub fn to_subtitle(&self, index: usize) -> Subtitle {
        Subtitle::new(
            index,
            self.start / TICKS_PER_SECOND,
            self.end / TICKS_PER_SECOND,
            self.text.trim(),
        )
    }
}

impl From<&RawSegment> for Cue {
    fn from(segment: &RawSegment) -> Self {
        Cue::new(segment.start, segment.end, segment.text.trim())
    }
}

/// Order in which duration validation and splitting run.
///
/// `ValidateThenSplit` is the historical pipeline: every oversized multi-word
/// segment is discarded before the splitter sees it. `SplitThenValidate`
/// offers oversized segments to the splitter first and only discards halves
/// that are still too long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageOrder {
    #[default]
    SplitThenValidate,
    ValidateThenSplit,
}

/// Drop phantom and junk segments, trimming the survivors into cues
pub fn filter_phantom_segments(segments: &[RawSegment], max_duration_sec: f64) -> Vec<Cue> {
    segments
        .iter()
        .filter(|segment| {
            let text_len = segment.text.trim().chars().count();

            if segment.duration_seconds() > max_duration_sec && text_len < PHANTOM_MAX_TEXT_LEN {
                debug!(
                    "Dropping phantom segment {:.2}s '{}'",
                    segment.duration_seconds(),
                    segment.text.trim()
                );
                return false;
            }

            text_len >= MIN_TEXT_LEN
        })
        .map(Cue::from)
        .collect()
}

/// Discard cues that exceed the cap, keeping unsplittable single-word cues.
/// Applying this to its own output changes nothing.
pub fn validate_segment_durations(cues: Vec<Cue>, max_duration_sec: f64) -> Vec<Cue> {
    cues.into_iter()
        .filter(|cue| !cue.is_oversized(max_duration_sec) || cue.word_count() <= 1)
        .collect()
}

/// Split a cue at its middle word, interpolating the split time linearly.
/// Returns `None` for cues with fewer than two words.
pub fn split_cue(cue: &Cue) -> Option<(Cue, Cue)> {
    let words: Vec<&str> = cue.text.split_whitespace().collect();
    if words.len() < 2 {
        return None;
    }

    let mid_point = words.len() / 2;
    let duration_per_word = cue.duration_seconds() / words.len() as f64;
    let split_time = cue.start + mid_point as f64 * duration_per_word * TICKS_PER_SECOND;

    let first_half = Cue::new(cue.start, split_time, words[..mid_point].join(" "));
    let second_half = Cue::new(split_time, cue.end, words[mid_point..].join(" "));

    Some((first_half, second_half))
}

/// Split every oversized cue once; single-word cues pass through unchanged
pub fn split_oversized_segments(cues: Vec<Cue>, max_duration_sec: f64) -> Vec<Cue> {
    let mut result = Vec::with_capacity(cues.len());

    for cue in cues {
        if !cue.is_oversized(max_duration_sec) {
            result.push(cue);
            continue;
        }

        match split_cue(&cue) {
            Some((first, second)) => {
                result.push(first);
                result.push(second);
            }
            None => result.push(cue),
        }
    }

    result
}

/// Render cues as SRT, numbering them from 1
pub fn render_srt(cues: &[Cue]) -> String {
    let subtitles: Vec<Subtitle> = cues
        .iter()
        .enumerate()
        .map(|(i, cue)| cue.to_subtitle(i + 1))
        .collect();

    subtitle_processor::to_srt_string(&subtitles)
}

/// Normalize with the default stage order
pub fn normalize(segments: &[RawSegment], max_duration_sec: f64) -> Vec<Cue> {
    SegmentNormalizer::new(max_duration_sec).normalize(segments)
}

/// Configured normalization pipeline
#[derive(Debug, Clone)]
pub struct SegmentNormalizer {
    max_duration_sec: f64,
    stage_order: StageOrder,
}

impl SegmentNormalizer {
    /// Create a normalizer with the default stage order
    pub fn new(max_duration_sec: f64) -> Self {
        Self {
            max_duration_sec,
            stage_order: StageOrder::default(),
        }
    }

    /// Override the stage order
    pub fn with_stage_order(mut self, stage_order: StageOrder) -> Self {
        self.stage_order = stage_order;
        self
    }

    pub fn max_duration_sec(&self) -> f64 {
        self.max_duration_sec
    }

    pub fn stage_order(&self) -> StageOrder {
        self.stage_order
    }

    /// Run filtering, validation and splitting
    pub fn normalize(&self, segments: &[RawSegment]) -> Vec<Cue> {
        let max = self.max_duration_sec;

        let filtered = filter_phantom_segments(segments, max);
        let filtered_count = filtered.len();

        let cues = match self.stage_order {
            StageOrder::SplitThenValidate => {
                validate_segment_durations(split_oversized_segments(filtered, max), max)
            }
            StageOrder::ValidateThenSplit => {
                split_oversized_segments(validate_segment_durations(filtered, max), max)
            }
        };

        debug!(
            "Normalized {} raw segments: {} after filtering, {} cues ({:?})",
            segments.len(),
            filtered_count,
            cues.len(),
            self.stage_order
        );

        cues
    }

    /// Normalize and render in one step
    pub fn normalize_to_srt(&self, segments: &[RawSegment]) -> String {
        render_srt(&self.normalize(segments))
    }
}

impl Default for SegmentNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SEGMENT_DURATION_SEC)
    }
}
