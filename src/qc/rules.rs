/*!
 * QC rule thresholds.
 *
 * Rules arrive as a loosely typed JSON document of the form
 * `{ "timing": { "min_duration_sec": 1, ... }, "reading_speed": {...}, "layout": {...} }`.
 * `RawRuleConfig` mirrors that document; `RuleConfig` is the validated form
 * with every threshold present, checked once when it is built.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::ConfigError;

/// Rule document as written on disk: category -> threshold name -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRuleConfig(BTreeMap<String, BTreeMap<String, Value>>);

impl RawRuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON rule document
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse rules JSON")
    }

    /// Look up a dotted key such as `timing.min_gap_sec`
    pub fn get(&self, key: &str) -> Option<&Value> {
        let (category, name) = key.split_once('.')?;
        self.0.get(category)?.get(name)
    }

    /// Set a dotted key, creating the category when needed
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        if let Some((category, name)) = key.split_once('.') {
            self.0
                .entry(category.to_string())
                .or_default()
                .insert(name.to_string(), value.into());
        }
    }

    /// Builder form of `set`
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Validate into a typed configuration
    pub fn validate(&self) -> Result<RuleConfig, ConfigError> {
        RuleConfig::try_from(self)
    }

    fn seconds(&self, key: &str) -> Result<f64, ConfigError> {
        let value = self.get(key).ok_or_else(|| ConfigError::MissingThreshold {
            key: key.to_string(),
        })?;

        match value.as_f64() {
            Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(ConfigError::InvalidThreshold {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    fn count(&self, key: &str) -> Result<usize, ConfigError> {
        let value = self.get(key).ok_or_else(|| ConfigError::MissingThreshold {
            key: key.to_string(),
        })?;

        // Accept 2 as well as 2.0, reject 2.5
        match value.as_f64() {
            Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(v as usize),
            _ => Err(ConfigError::InvalidThreshold {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Timing thresholds, all in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingRules {
    pub min_duration_sec: f64,
    pub max_duration_sec: f64,
    pub min_gap_sec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingSpeedRules {
    pub max_cps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutRules {
    pub max_lines: usize,
    pub max_chars_per_line: usize,
}

/// Validated rule configuration; every threshold is required
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub timing: TimingRules,
    pub reading_speed: ReadingSpeedRules,
    pub layout: LayoutRules,
}

impl RuleConfig {
    /// Load and validate a rules file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file: {}", path.display()))?;

        let raw = RawRuleConfig::from_json_str(&content)
            .with_context(|| format!("Invalid rules file: {}", path.display()))?;

        raw.validate()
            .with_context(|| format!("Invalid rules file: {}", path.display()))
    }

    /// Broadcast defaults, used to seed a fresh rules file
    pub fn broadcast_defaults() -> Self {
        Self {
            timing: TimingRules {
                min_duration_sec: 1.0,
                max_duration_sec: 7.0,
                min_gap_sec: 0.1,
            },
            reading_speed: ReadingSpeedRules { max_cps: 17.0 },
            layout: LayoutRules {
                max_lines: 2,
                max_chars_per_line: 42,
            },
        }
    }

    /// The raw document equivalent of this configuration
    pub fn to_raw(&self) -> RawRuleConfig {
        RawRuleConfig::new()
            .with("timing.min_duration_sec", self.timing.min_duration_sec)
            .with("timing.max_duration_sec", self.timing.max_duration_sec)
            .with("timing.min_gap_sec", self.timing.min_gap_sec)
            .with("reading_speed.max_cps", self.reading_speed.max_cps)
            .with("layout.max_lines", self.layout.max_lines)
            .with("layout.max_chars_per_line", self.layout.max_chars_per_line)
    }
}

impl TryFrom<&RawRuleConfig> for RuleConfig {
    type Error = ConfigError;

    fn try_from(raw: &RawRuleConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            timing: TimingRules {
                min_duration_sec: raw.seconds("timing.min_duration_sec")?,
                max_duration_sec: raw.seconds("timing.max_duration_sec")?,
                min_gap_sec: raw.seconds("timing.min_gap_sec")?,
            },
            reading_speed: ReadingSpeedRules {
                max_cps: raw.seconds("reading_speed.max_cps")?,
            },
            layout: LayoutRules {
                max_lines: raw.count("layout.max_lines")?,
                max_chars_per_line: raw.count("layout.max_chars_per_line")?,
            },
        })
    }
}
