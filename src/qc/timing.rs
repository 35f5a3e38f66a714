/*!
 * Timing rules: display duration limits and the minimum gap between
 * consecutive subtitles.
 *
 * Comparisons allow for sub-millisecond float noise: SRT timestamps only
 * carry millisecond precision, so a gap written as exactly `min_gap_sec`
 * must not fire even when the subtraction lands a hair below it.
 */

use crate::subtitle_processor::Subtitle;

use super::issue::{Issue, RuleKind};
use super::rules::TimingRules;

/// Tolerance applied to time comparisons, well below one millisecond
pub const TIME_TOLERANCE_SEC: f64 = 1e-6;

/// Check the duration limits of a single subtitle
pub fn check_duration(subtitle: &Subtitle, rules: &TimingRules, issues: &mut Vec<Issue>) {
    let duration = subtitle.duration();

    if duration < rules.min_duration_sec - TIME_TOLERANCE_SEC {
        issues.push(Issue::error(
            subtitle.index,
            RuleKind::DurationTooShort,
            format!(
                "Subtitle too short: {:.3}s (min {:.3}s)",
                duration, rules.min_duration_sec
            ),
        ));
    }

    if duration > rules.max_duration_sec + TIME_TOLERANCE_SEC {
        issues.push(Issue::error(
            subtitle.index,
            RuleKind::DurationTooLong,
            format!(
                "Subtitle too long: {:.3}s (max {:.3}s)",
                duration, rules.max_duration_sec
            ),
        ));
    }
}

/// Check the gap between a subtitle and the one before it in sequence order
pub fn check_gap(previous: &Subtitle, subtitle: &Subtitle, rules: &TimingRules, issues: &mut Vec<Issue>) {
    let gap = subtitle.start - previous.end;

    if gap < rules.min_gap_sec - TIME_TOLERANCE_SEC {
        issues.push(Issue::error(
            subtitle.index,
            RuleKind::GapTooSmall,
            format!(
                "Gap between subtitles too small: {:.3}s (min {:.3}s)",
                gap, rules.min_gap_sec
            ),
        ));
    }
}
