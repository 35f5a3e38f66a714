/*!
 * Repository layer for the subtitle library.
 *
 * High-level async API over the `subtitles` and `segments` tables:
 * saving parsed SRT tracks with their metadata, looking segments up,
 * full-text substring search, and re-rendering stored tracks.
 */

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row, params};
use sha2::{Digest, Sha256};

use crate::errors::StorageError;
use crate::subtitle_processor::{self, Subtitle};

use super::connection::DatabaseConnection;
use super::models::{SegmentMatch, SegmentRecord, SubtitleTrackRecord, TrackMetadata};

const TRACK_COLUMNS: &str =
    "s.kind, s.video_title, s.series, s.season, s.episode, s.music_title, s.language, s.filename";

const SEGMENT_COLUMNS: &str = "g.id, g.subtitle_id, g.position, g.segment_number, g.time_start, g.time_end, g.text";

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Compute SHA256 hash of text
    pub fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Parse `srt` and store it with `metadata`; returns the track id.
    ///
    /// Saving the same content with the same metadata twice returns the
    /// id of the first copy instead of inserting a duplicate.
    pub async fn save_track(&self, srt: &str, metadata: &TrackMetadata) -> Result<i64> {
        let metadata = metadata.validated()?;
        let subtitles = subtitle_processor::parse_srt_string(srt).context("Failed to parse SRT content")?;
        let content_hash = Self::hash_text(&subtitle_processor::to_srt_string(&subtitles));

        let track_id = self
            .db
            .transaction_async(move |tx| {
                if let Some(existing) = Self::find_duplicate(tx, &content_hash, &metadata)? {
                    debug!("Track already stored as #{}", existing);
                    return Ok(existing);
                }

                tx.execute(
                    r#"
                    INSERT INTO subtitles (
                        kind, video_title, series, season, episode, music_title,
                        language, filename, content_hash, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    "#,
                    params![
                        metadata.kind.to_string(),
                        metadata.video_title,
                        metadata.series,
                        metadata.season,
                        metadata.episode,
                        metadata.music_title,
                        metadata.language,
                        metadata.filename,
                        content_hash,
                        chrono::Utc::now().to_rfc3339(),
                    ],
                )?;
                let track_id = tx.last_insert_rowid();

                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO segments (subtitle_id, position, segment_number, time_start, time_end, text)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                )?;
                for (position, subtitle) in subtitles.iter().enumerate() {
                    stmt.execute(params![
                        track_id,
                        position as i64,
                        subtitle.index as i64,
                        subtitle.start,
                        subtitle.end,
                        subtitle.text,
                    ])?;
                }

                info!(
                    "Saved subtitle track #{} ({}, {} segments)",
                    track_id,
                    metadata.label(),
                    subtitles.len()
                );
                Ok(track_id)
            })
            .await?;

        Ok(track_id)
    }

    fn find_duplicate(conn: &Connection, content_hash: &str, metadata: &TrackMetadata) -> Result<Option<i64>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT s.id, {} FROM subtitles s WHERE s.content_hash = ?1 ORDER BY s.id",
            TRACK_COLUMNS
        ))?;

        let candidates = stmt
            .query_map([content_hash], |row| Ok((row.get::<_, i64>(0)?, Self::track_metadata_at(row, 1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(candidates
            .into_iter()
            .find(|(_, stored)| stored == metadata)
            .map(|(id, _)| id))
    }

    fn track_metadata_at(row: &Row, offset: usize) -> rusqlite::Result<TrackMetadata> {
        Ok(TrackMetadata {
            kind: row.get::<_, String>(offset)?.parse().unwrap_or_default(),
            video_title: row.get(offset + 1)?,
            series: row.get(offset + 2)?,
            season: row.get(offset + 3)?,
            episode: row.get(offset + 4)?,
            music_title: row.get(offset + 5)?,
            language: row.get(offset + 6)?,
            filename: row.get(offset + 7)?,
        })
    }

    fn segment_at(row: &Row, offset: usize) -> rusqlite::Result<SegmentRecord> {
        Ok(SegmentRecord {
            id: row.get(offset)?,
            subtitle_id: row.get(offset + 1)?,
            position: row.get(offset + 2)?,
            segment_number: row.get(offset + 3)?,
            time_start: row.get(offset + 4)?,
            time_end: row.get(offset + 5)?,
            text: row.get(offset + 6)?,
        })
    }

    fn segment_match(row: &Row) -> rusqlite::Result<SegmentMatch> {
        Ok(SegmentMatch {
            segment: Self::segment_at(row, 0)?,
            track: Self::track_metadata_at(row, 7)?,
        })
    }

    /// Get a stored track by id
    pub async fn get_track(&self, track_id: i64) -> Result<Option<SubtitleTrackRecord>> {
        self.db
            .execute_async(move |conn| {
                let record = conn
                    .query_row(
                        &format!(
                            "SELECT s.id, {}, s.content_hash, s.created_at FROM subtitles s WHERE s.id = ?1",
                            TRACK_COLUMNS
                        ),
                        [track_id],
                        |row| {
                            Ok(SubtitleTrackRecord {
                                id: row.get(0)?,
                                metadata: Self::track_metadata_at(row, 1)?,
                                content_hash: row.get(9)?,
                                created_at: row.get(10)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(record)
            })
            .await
    }

    /// All segments of a track, in file order
    pub async fn get_segments(&self, track_id: i64) -> Result<Vec<SegmentRecord>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM segments g WHERE g.subtitle_id = ?1 ORDER BY g.position",
                    SEGMENT_COLUMNS
                ))?;

                let segments = stmt
                    .query_map([track_id], |row| Self::segment_at(row, 0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(segments)
            })
            .await
    }

    /// One segment with the metadata of its track
    pub async fn get_segment_by_id(&self, segment_id: i64) -> Result<Option<SegmentMatch>> {
        self.db
            .execute_async(move |conn| {
                let found = conn
                    .query_row(
                        &format!(
                            "SELECT {}, {} FROM segments g JOIN subtitles s ON s.id = g.subtitle_id WHERE g.id = ?1",
                            SEGMENT_COLUMNS, TRACK_COLUMNS
                        ),
                        [segment_id],
                        Self::segment_match,
                    )
                    .optional()?;
                Ok(found)
            })
            .await
    }

    /// Case-insensitive substring search over segment text
    pub async fn search_segments_by_text(&self, query: &str) -> Result<Vec<SegmentMatch>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Err(anyhow!("Search text is required"));
        }

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"
                    SELECT {}, {}
                    FROM segments g JOIN subtitles s ON s.id = g.subtitle_id
                    WHERE instr(lower(g.text), ?1) > 0
                    ORDER BY g.subtitle_id, g.position
                    "#,
                    SEGMENT_COLUMNS, TRACK_COLUMNS
                ))?;

                let matches = stmt
                    .query_map([&query], Self::segment_match)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                debug!("Search for '{}' matched {} segments", query, matches.len());
                Ok(matches)
            })
            .await
    }

    /// Delete a track and its segments; returns whether it existed
    pub async fn delete_track(&self, track_id: i64) -> Result<bool> {
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM subtitles WHERE id = ?1", [track_id])?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Render a stored track back to SRT text
    pub async fn track_srt(&self, track_id: i64) -> Result<String> {
        if self.get_track(track_id).await?.is_none() {
            return Err(StorageError::NotFound {
                entity: "subtitle track",
                id: track_id,
            }
            .into());
        }

        let subtitles: Vec<Subtitle> = self
            .get_segments(track_id)
            .await?
            .into_iter()
            .map(|s| Subtitle::new(s.segment_number.max(0) as usize, s.time_start, s.time_end, s.text))
            .collect();

        Ok(subtitle_processor::to_srt_string(&subtitles))
    }
}
