/*!
 * QC findings.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of rules the engine evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    DurationTooShort,
    DurationTooLong,
    CpsTooHigh,
    TooManyLines,
    LineTooLong,
    GapTooSmall,
}

impl RuleKind {
    /// Identifier as it appears in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::DurationTooShort => "DURATION_TOO_SHORT",
            RuleKind::DurationTooLong => "DURATION_TOO_LONG",
            RuleKind::CpsTooHigh => "CPS_TOO_HIGH",
            RuleKind::TooManyLines => "TOO_MANY_LINES",
            RuleKind::LineTooLong => "LINE_TOO_LONG",
            RuleKind::GapTooSmall => "GAP_TOO_SMALL",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DURATION_TOO_SHORT" => Ok(RuleKind::DurationTooShort),
            "DURATION_TOO_LONG" => Ok(RuleKind::DurationTooLong),
            "CPS_TOO_HIGH" => Ok(RuleKind::CpsTooHigh),
            "TOO_MANY_LINES" => Ok(RuleKind::TooManyLines),
            "LINE_TOO_LONG" => Ok(RuleKind::LineTooLong),
            "GAP_TOO_SMALL" => Ok(RuleKind::GapTooSmall),
            _ => Err(anyhow::anyhow!("Invalid rule: {}", s)),
        }
    }
}

/// Issue severity. Only errors are produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum Severity {
    #[default]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// One QC finding against one subtitle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Index field of the offending subtitle
    pub index: usize,
    pub rule: RuleKind,
    pub message: String,
    pub severity: Severity,
}

impl Issue {
    /// Create an error-level issue
    pub fn error(index: usize, rule: RuleKind, message: impl Into<String>) -> Self {
        Self {
            index,
            rule,
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subtitle #{} | {} | {}", self.index, self.rule, self.message)
    }
}
