/*!
 * Rule evaluation over a parsed subtitle track.
 *
 * Every subtitle is checked independently, in file order, against every
 * rule in a fixed order: duration, reading speed, layout, gap. A subtitle
 * can collect several issues; nothing is deduplicated.
 */

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::{ConfigError, SubtitleError};
use crate::subtitle_processor::{self, Subtitle};

use super::issue::{Issue, RuleKind};
use super::layout::check_layout;
use super::reading_speed::check_reading_speed;
use super::rules::{RawRuleConfig, RuleConfig};
use super::timing::{check_duration, check_gap};

/// Evaluate every rule against every subtitle.
///
/// The gap rule looks at the previous element of `subtitles`, not at the
/// subtitle whose index field is one lower.
pub fn evaluate(subtitles: &[Subtitle], rules: &RuleConfig) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (position, subtitle) in subtitles.iter().enumerate() {
        check_duration(subtitle, &rules.timing, &mut issues);
        check_reading_speed(subtitle, &rules.reading_speed, &mut issues);
        check_layout(subtitle, &rules.layout, &mut issues);

        if position > 0 {
            check_gap(&subtitles[position - 1], subtitle, &rules.timing, &mut issues);
        }
    }

    debug!(
        "QC evaluated {} subtitles, {} issues",
        subtitles.len(),
        issues.len()
    );

    issues
}

/// Validate a raw rule document, then evaluate. Nothing is evaluated when a
/// threshold is missing.
pub fn evaluate_raw(subtitles: &[Subtitle], rules: &RawRuleConfig) -> Result<Vec<Issue>, ConfigError> {
    let rules = rules.validate()?;
    Ok(evaluate(subtitles, &rules))
}

/// Outcome of a QC run over one track
#[derive(Debug, Clone, Serialize)]
pub struct QcReport {
    /// Number of subtitles checked
    pub subtitle_count: usize,
    /// Issues in encounter order
    pub issues: Vec<Issue>,
}

impl QcReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issue counts per rule
    pub fn count_by_rule(&self) -> BTreeMap<RuleKind, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.rule).or_insert(0) += 1;
        }
        counts
    }

    /// Number of distinct subtitle indices with at least one issue
    pub fn failed_subtitles(&self) -> usize {
        let mut indices: Vec<usize> = self.issues.iter().map(|i| i.index).collect();
        indices.sort_unstable();
        indices.dedup();
        indices.len()
    }
}

/// QC engine bound to one validated rule set
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: RuleConfig,
}

impl RuleEngine {
    pub fn new(rules: RuleConfig) -> Self {
        Self { rules }
    }

    /// Build from a raw rule document, failing on missing thresholds
    pub fn from_raw(rules: &RawRuleConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(rules.validate()?))
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// Evaluate already parsed subtitles
    pub fn check(&self, subtitles: &[Subtitle]) -> QcReport {
        QcReport {
            subtitle_count: subtitles.len(),
            issues: evaluate(subtitles, &self.rules),
        }
    }

    /// Parse SRT text and evaluate it
    pub fn check_srt(&self, content: &str) -> Result<QcReport, SubtitleError> {
        let subtitles = subtitle_processor::parse_srt_string(content)?;
        Ok(self.check(&subtitles))
    }

    /// Read, parse and evaluate an SRT file
    pub fn check_file<P: AsRef<Path>>(&self, path: P) -> Result<QcReport> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

        self.check_srt(&content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))
    }
}
