/*!
 * Integration tests for the SQLite subtitle library
 */

use anyhow::Result;
use subclean::database::{DatabaseConnection, Repository};
use subclean::database::models::{TrackKind, TrackMetadata};
use subclean::errors::StorageError;
use subclean::subtitle_processor::parse_srt_string;
use crate::common;

fn file_repository(dir: &std::path::Path) -> Result<Repository> {
    Ok(Repository::new(DatabaseConnection::new(dir.join("db").join("subtitles.db"))?))
}

/// Test that a saved track renders back to the same SRT
#[tokio::test]
async fn test_saveTrack_thenTrackSrt_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = file_repository(temp_dir.path())?;

    let id = repository
        .save_track(common::CLEAN_SRT, &TrackMetadata::video("Heat", "en", "heat.mkv"))
        .await?;

    assert_eq!(repository.track_srt(id).await?, common::CLEAN_SRT);

    let record = repository.get_track(id).await?.unwrap();
    assert_eq!(record.metadata.kind, TrackKind::Video);
    assert_eq!(record.metadata.language, "eng");
    assert_eq!(record.content_hash, Repository::hash_text(common::CLEAN_SRT));
    Ok(())
}

/// Test that the database survives reopening the file
#[tokio::test]
async fn test_saveTrack_thenReopen_shouldKeepData() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let id = {
        let repository = file_repository(temp_dir.path())?;
        repository
            .save_track(common::CLEAN_SRT, &TrackMetadata::music("Song", "fr", "song.mp4"))
            .await?
    };

    let reopened = file_repository(temp_dir.path())?;
    let segments = reopened.get_segments(id).await?;

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[2].text, "For testing purposes.");
    assert_eq!(reopened.connection().stats()?.track_count, 1);
    Ok(())
}

/// Test that saving the same content with different metadata stores two tracks
#[tokio::test]
async fn test_saveTrack_withDifferentMetadata_shouldNotDeduplicate() -> Result<()> {
    let repository = Repository::new_in_memory()?;

    let first = repository
        .save_track(common::CLEAN_SRT, &TrackMetadata::video("Heat", "en", "heat.mkv"))
        .await?;
    let again = repository
        .save_track(common::CLEAN_SRT, &TrackMetadata::video("Heat", "eng", "heat.mkv"))
        .await?;
    let other = repository
        .save_track(common::CLEAN_SRT, &TrackMetadata::video("Heat", "de", "heat.mkv"))
        .await?;

    assert_eq!(first, again);
    assert_ne!(first, other);
    assert_eq!(repository.connection().stats()?.segment_count, 6);
    Ok(())
}

/// Test search across tracks, with track metadata attached
#[tokio::test]
async fn test_searchSegmentsByText_acrossTracks_shouldReturnMatchesInOrder() -> Result<()> {
    let repository = Repository::new_in_memory()?;

    let series_id = repository
        .save_track(
            common::CLEAN_SRT,
            &TrackMetadata::series("Dark", Some(1), Some(2), "de", "dark_s01e02.mkv"),
        )
        .await?;
    repository
        .save_track(common::FAULTY_SRT, &TrackMetadata::video("Other", "en", "other.mkv"))
        .await?;

    let matches = repository.search_segments_by_text("TEXT").await?;

    assert_eq!(matches.len(), 2);
    assert_ne!(matches[0].segment.subtitle_id, series_id);
    assert!(matches.iter().all(|m| m.track.label() == "Other"));

    let matches = repository.search_segments_by_text("testing").await?;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].track.label(), "Dark S01E02");
    assert_eq!(matches[0].segment.segment_number, 3);
    Ok(())
}

/// Test that deleting a track removes its segments and makes it unknown
#[tokio::test]
async fn test_deleteTrack_shouldCascadeToSegments() -> Result<()> {
    let repository = Repository::new_in_memory()?;
    let id = repository
        .save_track(common::CLEAN_SRT, &TrackMetadata::video("Heat", "en", "heat.mkv"))
        .await?;
    let segment_id = repository.get_segments(id).await?[0].id;

    assert!(repository.delete_track(id).await?);
    assert!(!repository.delete_track(id).await?);

    assert!(repository.get_segment_by_id(segment_id).await?.is_none());
    assert_eq!(repository.connection().stats()?.segment_count, 0);

    let err = repository.track_srt(id).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::NotFound { .. })
    ));
    Ok(())
}

/// Test that invalid input is rejected before anything is written
#[tokio::test]
async fn test_saveTrack_withInvalidInput_shouldWriteNothing() -> Result<()> {
    let repository = Repository::new_in_memory()?;

    let bad_language = repository
        .save_track(common::CLEAN_SRT, &TrackMetadata::video("Heat", "xx", "heat.mkv"))
        .await;
    let bad_srt = repository
        .save_track("1\nnot a timing line\nText\n", &TrackMetadata::video("Heat", "en", "heat.mkv"))
        .await;
    let missing_title = repository
        .save_track(common::CLEAN_SRT, &TrackMetadata::video("  ", "en", "heat.mkv"))
        .await;

    assert!(bad_language.is_err());
    assert!(bad_srt.is_err());
    assert!(missing_title.is_err());
    assert_eq!(repository.connection().stats()?.track_count, 0);
    Ok(())
}

/// Test that stored times keep millisecond precision
#[tokio::test]
async fn test_getSegmentById_shouldKeepTimes() -> Result<()> {
    let repository = Repository::new_in_memory()?;
    let id = repository
        .save_track(common::FAULTY_SRT, &TrackMetadata::video("Other", "en", "other.mkv"))
        .await?;

    let segment_id = repository.get_segments(id).await?[1].id;
    let found = repository.get_segment_by_id(segment_id).await?.unwrap();

    let expected = &parse_srt_string(common::FAULTY_SRT)?[1];
    assert_eq!(found.segment.time_start, expected.start);
    assert_eq!(found.segment.time_end, expected.end);
    assert_eq!(found.track.filename, "other.mkv");
    Ok(())
}

/// Test that repeated and out-of-order index lines are stored in file order
#[tokio::test]
async fn test_saveTrack_withRepeatedAndUnorderedIndices_shouldKeepFileOrder() -> Result<()> {
    let repository = Repository::new_in_memory()?;
    let repeated = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n1\n00:00:03,000 --> 00:00:04,000\nSecond\n";
    let unordered = "2\n00:00:01,000 --> 00:00:02,000\nAlpha\n\n1\n00:00:03,000 --> 00:00:04,000\nBravo\n";

    let repeated_id = repository
        .save_track(repeated, &TrackMetadata::video("Heat", "en", "heat.mkv"))
        .await?;
    let unordered_id = repository
        .save_track(unordered, &TrackMetadata::video("Ronin", "en", "ronin.mkv"))
        .await?;

    let segments = repository.get_segments(repeated_id).await?;
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].segment_number, 1);
    assert_eq!(segments[1].segment_number, 1);
    assert_eq!(segments[1].text, "Second");

    let segments = repository.get_segments(unordered_id).await?;
    assert_eq!(segments.iter().map(|s| s.position).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(segments[0].text, "Alpha");
    assert_eq!(segments[0].segment_number, 2);
    assert_eq!(repository.track_srt(unordered_id).await?, unordered);
    Ok(())
}
