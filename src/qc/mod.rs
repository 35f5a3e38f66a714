/*!
 * Subtitle quality control.
 *
 * A data-driven rule engine that checks a parsed SRT track against
 * configurable thresholds for timing, reading speed and layout:
 * - `rules`: raw and validated rule configuration
 * - `timing`: duration and gap checks
 * - `reading_speed`: characters-per-second check
 * - `layout`: line count and line length checks
 * - `service`: per-track evaluation and reports
 */

pub mod issue;
pub mod layout;
pub mod reading_speed;
pub mod rules;
pub mod service;
pub mod timing;

pub use issue::{Issue, RuleKind, Severity};
pub use rules::{LayoutRules, RawRuleConfig, ReadingSpeedRules, RuleConfig, TimingRules};
pub use service::{QcReport, RuleEngine, evaluate, evaluate_raw};
