/*!
 * Layout rules: number of lines and characters per line.
 */

use crate::subtitle_processor::Subtitle;

use super::issue::{Issue, RuleKind};
use super::rules::LayoutRules;

/// Check line count, then each line's length (one issue per long line)
pub fn check_layout(subtitle: &Subtitle, rules: &LayoutRules, issues: &mut Vec<Issue>) {
    let lines = subtitle.lines();

    if lines.len() > rules.max_lines {
        issues.push(Issue::error(
            subtitle.index,
            RuleKind::TooManyLines,
            format!("More than {} lines ({})", rules.max_lines, lines.len()),
        ));
    }

    for (line_number, line) in lines.iter().enumerate() {
        let length = line.chars().count();
        if length > rules.max_chars_per_line {
            issues.push(Issue::error(
                subtitle.index,
                RuleKind::LineTooLong,
                format!(
                    "Line {} exceeds max length: {} chars (max {})",
                    line_number + 1,
                    length,
                    rules.max_chars_per_line
                ),
            ));
        }
    }
}
