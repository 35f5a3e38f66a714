/*!
 * Reading speed rule (characters per second of visible text).
 */

use crate::subtitle_processor::Subtitle;

use super::issue::{Issue, RuleKind};
use super::rules::ReadingSpeedRules;

/// CPS reported for subtitles with no positive duration
pub const ZERO_DURATION_CPS: f64 = 999.0;

/// Visible characters per second; zero or negative durations yield the sentinel
pub fn calculate_cps(subtitle: &Subtitle) -> f64 {
    let duration = subtitle.duration();
    if duration > 0.0 {
        subtitle.chars() as f64 / duration
    } else {
        ZERO_DURATION_CPS
    }
}

pub fn check_reading_speed(subtitle: &Subtitle, rules: &ReadingSpeedRules, issues: &mut Vec<Issue>) {
    let cps = calculate_cps(subtitle);

    if cps > rules.max_cps {
        issues.push(Issue::error(
            subtitle.index,
            RuleKind::CpsTooHigh,
            format!("Reading speed {:.1} CPS exceeds limit of {:.1}", cps, rules.max_cps),
        ));
    }
}
