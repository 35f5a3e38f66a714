/*!
 * Tests for the QC rule engine
 */

use anyhow::Result;
use subclean::errors::ConfigError;
use subclean::qc::{RawRuleConfig, RuleConfig, RuleEngine, RuleKind, evaluate, evaluate_raw};
use subclean::subtitle_processor::{Subtitle, parse_srt_string};
use crate::common;

fn engine() -> RuleEngine {
    RuleEngine::new(RuleConfig::broadcast_defaults())
}

/// A clean track raises nothing
#[test]
fn test_checkSrt_withCleanTrack_shouldPass() {
    let report = engine().check_srt(common::CLEAN_SRT).unwrap();

    assert!(report.passed());
    assert_eq!(report.subtitle_count, 3);
    assert_eq!(report.failed_subtitles(), 0);
}

/// Every rule fires once on the faulty fixture, in rule order per subtitle
#[test]
fn test_checkSrt_withFaultyTrack_shouldReportEveryRule() {
    let report = engine().check_srt(common::FAULTY_SRT).unwrap();

    let found: Vec<(usize, RuleKind)> = report.issues.iter().map(|i| (i.index, i.rule)).collect();
    assert_eq!(
        found,
        vec![
            (1, RuleKind::DurationTooShort),
            (1, RuleKind::CpsTooHigh),
            (1, RuleKind::LineTooLong),
            (2, RuleKind::DurationTooLong),
            (2, RuleKind::TooManyLines),
            (2, RuleKind::GapTooSmall),
        ]
    );
    assert_eq!(report.failed_subtitles(), 2);
    assert!(report.count_by_rule().values().all(|count| *count == 1));
}

/// Two quick subtitles with a 50ms gap: short, fast, and too close
#[test]
fn test_evaluate_withShortCloseSubtitles_shouldFlagDurationCpsAndGap() {
    let subtitles = vec![
        Subtitle::new(1, 0.0, 0.5, "Hello there everyone"),
        Subtitle::new(2, 0.55, 2.0, "Hi"),
    ];

    let issues = evaluate(&subtitles, &RuleConfig::broadcast_defaults());

    let found: Vec<(usize, RuleKind)> = issues.iter().map(|i| (i.index, i.rule)).collect();
    assert_eq!(
        found,
        vec![
            (1, RuleKind::DurationTooShort),
            (1, RuleKind::CpsTooHigh),
            (2, RuleKind::GapTooSmall),
        ]
    );
}

/// A gap of exactly the minimum is accepted despite float noise
#[test]
fn test_evaluate_withGapExactlyAtMinimum_shouldPass() {
    let subtitles = parse_srt_string(
        "1\n00:00:01,000 --> 00:00:02,300\nOne\n\n2\n00:00:02,400 --> 00:00:04,000\nTwo\n",
    )
    .unwrap();

    let issues = evaluate(&subtitles, &RuleConfig::broadcast_defaults());

    assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
}

/// Markup does not count towards reading speed
#[test]
fn test_evaluate_withItalicTags_shouldNotCountMarkup() {
    let subtitles = vec![Subtitle::new(1, 0.0, 1.0, "<i>Sixteen chars..</i>")];

    let issues = evaluate(&subtitles, &RuleConfig::broadcast_defaults());

    assert!(issues.is_empty());
}

/// Missing thresholds stop evaluation before any subtitle is checked
#[test]
fn test_evaluateRaw_withMissingThreshold_shouldFailWithKey() {
    let raw = RuleConfig::broadcast_defaults().to_raw();
    let mut incomplete = RawRuleConfig::new();
    for key in [
        "timing.min_duration_sec",
        "timing.max_duration_sec",
        "reading_speed.max_cps",
        "layout.max_lines",
        "layout.max_chars_per_line",
    ] {
        incomplete.set(key, raw.get(key).cloned().unwrap());
    }

    let subtitles = parse_srt_string(common::FAULTY_SRT).unwrap();
    let err = evaluate_raw(&subtitles, &incomplete).unwrap_err();

    match err {
        ConfigError::MissingThreshold { key } => assert_eq!(key, "timing.min_gap_sec"),
        other => panic!("unexpected error: {:?}", other),
    }
}

/// A fractional line limit is rejected
#[test]
fn test_fromRaw_withFractionalLineCount_shouldFail() {
    let raw = RuleConfig::broadcast_defaults().to_raw().with("layout.max_lines", 2.5);

    let err = RuleEngine::from_raw(&raw).unwrap_err();

    assert!(matches!(err, ConfigError::InvalidThreshold { .. }));
}

/// Rules load from a JSON file on disk
#[test]
fn test_ruleConfigLoad_fromFile_shouldMatchDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "rules.json", &common::rules_json())?;

    let rules = RuleConfig::load(&path)?;

    assert_eq!(rules, RuleConfig::broadcast_defaults());
    Ok(())
}

/// Stricter custom rules change the outcome on the same track
#[test]
fn test_checkSrt_withStricterRules_shouldFlagCleanTrack() -> Result<()> {
    let raw = RawRuleConfig::from_json_str(&common::rules_json())?.with("layout.max_chars_per_line", 20);
    let engine = RuleEngine::from_raw(&raw)?;

    let report = engine.check_srt(common::CLEAN_SRT)?;

    assert_eq!(report.count_by_rule().get(&RuleKind::LineTooLong), Some(&3));
    Ok(())
}

/// Reports serialize rule identifiers in their report form
#[test]
fn test_qcReport_serialized_shouldUseRuleIdentifiers() -> Result<()> {
    let report = engine().check_srt(common::FAULTY_SRT)?;

    let json = serde_json::to_string(&report)?;

    assert!(json.contains("\"GAP_TOO_SMALL\""));
    assert!(json.contains("\"subtitle_count\":2"));
    Ok(())
}

/// Rule identifiers parse case-insensitively
#[test]
fn test_ruleKind_fromStr_shouldAcceptLowercase() {
    assert_eq!("cps_too_high".parse::<RuleKind>().unwrap(), RuleKind::CpsTooHigh);
    assert!("NOT_A_RULE".parse::<RuleKind>().is_err());
}
