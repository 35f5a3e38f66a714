/*!
 * Sources of raw transcription segments.
 *
 * The speech-to-text engine itself lives outside this crate. Anything that
 * can hand over a list of timed segments implements `SegmentSource`:
 * - `JsonSegmentSource`: a JSON array exported by the engine
 * - `StaticSegmentSource`: segments already in memory
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::normalizer::RawSegment;

/// Common trait for all segment sources
#[async_trait]
pub trait SegmentSource: Send + Sync + Debug {
    /// Produce the raw segments, timings in centisecond ticks
    async fn segments(&self) -> Result<Vec<RawSegment>>;

    /// Short description used in log messages
    fn describe(&self) -> String;
}

/// Reads `[{"start": 0, "end": 250, "text": "..."}]`; `t0`/`t1` are accepted as well
#[derive(Debug, Clone)]
pub struct JsonSegmentSource {
    path: PathBuf,
}

impl JsonSegmentSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse segments from JSON text
    pub fn parse(json: &str) -> Result<Vec<RawSegment>> {
        serde_json::from_str(json).context("Failed to parse transcription segments")
    }
}

#[async_trait]
impl SegmentSource for JsonSegmentSource {
    async fn segments(&self) -> Result<Vec<RawSegment>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read segments file: {}", self.path.display()))?;

        let segments = Self::parse(&content)
            .with_context(|| format!("Invalid segments file: {}", self.path.display()))?;

        debug!("Loaded {} raw segments from {}", segments.len(), self.path.display());
        Ok(segments)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory segments, mostly for tests and library callers
#[derive(Debug, Clone, Default)]
pub struct StaticSegmentSource {
    segments: Vec<RawSegment>,
}

impl StaticSegmentSource {
    pub fn new(segments: Vec<RawSegment>) -> Self {
        Self { segments }
    }
}

#[async_trait]
impl SegmentSource for StaticSegmentSource {
    async fn segments(&self) -> Result<Vec<RawSegment>> {
        Ok(self.segments.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory segments", self.segments.len())
    }
}
