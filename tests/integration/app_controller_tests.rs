/*!
 * Integration tests for the application controller
 */

use anyhow::Result;
use subclean::app_config::Config;
use subclean::app_controller::Controller;
use subclean::database::models::TrackMetadata;
use subclean::normalizer::RawSegment;
use subclean::qc::{RuleConfig, RuleKind};
use subclean::transcription::StaticSegmentSource;
use crate::common;

/// Test that an invalid configuration is rejected up front
#[test]
fn test_withConfig_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.normalizer.max_segment_duration_sec = -1.0;

    assert!(Controller::with_config(config).is_err());
}

/// Test that transcripts are normalized and written to disk
#[tokio::test]
async fn test_transcriptToSrt_withStaticSource_shouldWriteCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;
    let source = StaticSegmentSource::new(vec![
        RawSegment::new(0.0, 1500.0, "hi"),
        RawSegment::new(0.0, 1200.0, "the quick brown fox jumps over"),
    ]);
    let output = temp_dir.path().join("out").join("episode.srt");

    let outcome = controller.transcript_to_srt(&source, &output).await?;

    assert_eq!(outcome.raw_segments, 2);
    assert_eq!(outcome.cues, 2);
    let written = std::fs::read_to_string(&output)?;
    assert!(written.starts_with("1\n00:00:00,000 --> 00:00:06,000\nthe quick brown\n"));
    Ok(())
}

/// Test that an empty transcript still produces an (empty) file
#[tokio::test]
async fn test_transcriptToSrt_withOnlyPhantoms_shouldWriteEmptyFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;
    let source = StaticSegmentSource::new(vec![RawSegment::new(0.0, 1500.0, "hi")]);
    let output = temp_dir.path().join("empty.srt");

    let outcome = controller.transcript_to_srt(&source, &output).await?;

    assert_eq!(outcome.cues, 0);
    assert_eq!(std::fs::read_to_string(&output)?, "");
    Ok(())
}

/// Test that a missing rules file is seeded with broadcast defaults
#[test]
fn test_loadRules_withMissingFile_shouldSeedDefaults() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;

    let rules = controller.load_rules()?;

    assert_eq!(rules, RuleConfig::broadcast_defaults());
    assert!(temp_dir.path().join("rules.json").exists());
    assert_eq!(RuleConfig::load(temp_dir.path().join("rules.json"))?, rules);
    Ok(())
}

/// Test that an existing rules file is used as is
#[test]
fn test_loadRules_withExistingFile_shouldReadIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let json = common::rules_json().replace("\"max_cps\": 17", "\"max_cps\": 12");
    common::create_test_file(temp_dir.path(), "rules.json", &json)?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;

    let rules = controller.load_rules()?;

    assert_eq!(rules.reading_speed.max_cps, 12.0);
    Ok(())
}

/// Test QC over a folder: good files are reported, broken ones listed as failures
#[tokio::test]
async fn test_runQc_onFolder_shouldReportEachFile() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().join("subs");
    common::create_test_file(&root, "a_clean.srt", common::CLEAN_SRT)?;
    common::create_test_file(&root, "b_faulty.srt", common::FAULTY_SRT)?;
    common::create_test_file(&root, "c_broken.srt", "1\nbroken\n")?;
    common::create_test_file(&root, "notes.txt", "ignored")?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;

    let run = controller.run_qc(&root, RuleConfig::broadcast_defaults()).await?;

    assert_eq!(run.reports.len(), 2);
    assert!(run.reports[0].1.passed());
    assert_eq!(
        run.reports[1].1.count_by_rule().get(&RuleKind::GapTooSmall),
        Some(&1)
    );
    assert_eq!(run.failures.len(), 1);
    assert!(run.failures[0].0.ends_with("c_broken.srt"));
    assert!(!run.passed());
    Ok(())
}

/// Test that a corrupt file fails a folder run even when every other file is clean
#[tokio::test]
async fn test_runQc_onFolderWithCleanAndCorruptFile_shouldNotPass() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().join("subs");
    common::create_test_file(&root, "clean.srt", common::CLEAN_SRT)?;
    common::create_test_file(&root, "corrupt.srt", "1\n00:00:01,000 --> 00:00:02,000\n\nx\nnot a timing line\n")?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;

    let run = controller.run_qc(&root, RuleConfig::broadcast_defaults()).await?;

    assert_eq!(run.reports.len(), 1);
    assert!(run.reports[0].1.passed());
    assert_eq!(run.failures.len(), 1);
    assert!(run.failures[0].0.ends_with("corrupt.srt"));
    assert!(!run.failures[0].1.is_empty());
    assert!(!run.passed());
    Ok(())
}

/// Test that a folder of clean files passes
#[tokio::test]
async fn test_runQc_onCleanFolder_shouldPass() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().join("subs");
    common::create_test_file(&root, "clean.srt", common::CLEAN_SRT)?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;

    let run = controller.run_qc(&root, RuleConfig::broadcast_defaults()).await?;

    assert!(run.failures.is_empty());
    assert!(run.passed());
    Ok(())
}

/// Test QC on a single broken file propagates the parse error
#[tokio::test]
async fn test_runQc_onBrokenFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.srt", "x\n00:00:01,000 --> 00:00:02,000\n")?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;

    let result = controller.run_qc(&path, RuleConfig::broadcast_defaults()).await;

    assert!(result.is_err());
    assert!(controller
        .run_qc(&temp_dir.path().join("missing"), RuleConfig::broadcast_defaults())
        .await
        .is_err());
    Ok(())
}

/// Test save then search through the controller's configured database
#[tokio::test]
async fn test_saveTrack_thenSearch_shouldFindSegment() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;
    let srt = common::create_test_subtitle(temp_dir.path(), "heat.srt")?;
    let repository = controller.open_repository()?;

    let id = controller
        .save_track(&repository, &srt, &TrackMetadata::video("Heat", "English", "heat.mkv"))
        .await?;
    let matches = controller.search(&repository, "multiple").await?;

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].segment.subtitle_id, id);
    assert!(temp_dir.path().join("subtitles.db").exists());
    assert!(controller.search(&repository, "   ").await.is_err());
    Ok(())
}

/// Test that clip extraction reports unknown segments and missing videos
#[tokio::test]
async fn test_extractSegmentClip_withoutSegmentOrVideo_shouldFail() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;
    let repository = controller.open_repository()?;

    let missing = controller.extract_segment_clip(&repository, 42).await.unwrap_err();
    assert!(missing.to_string().contains("42"));

    let id = repository
        .save_track(common::CLEAN_SRT, &TrackMetadata::video("Heat", "en", "heat.mkv"))
        .await?;
    let segment_id = repository.get_segments(id).await?[0].id;

    let no_video = controller
        .extract_segment_clip(&repository, segment_id)
        .await
        .unwrap_err();
    assert!(no_video.to_string().contains("heat.mkv"));
    Ok(())
}

/// Test that audio extraction with no videos does nothing
#[tokio::test]
async fn test_extractAudioFromFolder_withNoVideos_shouldReturnEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(common::config_in(temp_dir.path()))?;

    let outputs = controller.extract_audio_from_folder().await?;

    assert!(outputs.is_empty());
    Ok(())
}
