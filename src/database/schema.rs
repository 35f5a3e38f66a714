/*!
 * Subtitle library schema.
 *
 * Two tables hold the subtitle library: `subtitles` (one row per stored
 * track with its media metadata) and `segments` (one row per cue, removed
 * together with its track).
 */

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Create the schema on a fresh database and check the version of an existing one
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Foreign keys are off by default on every new SQLite connection
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    match get_schema_version(conn)? {
        0 => {
            info!("Creating subtitle library schema v{}", SCHEMA_VERSION);
            create_all_tables(conn)?;
            set_schema_version(conn, SCHEMA_VERSION)?;
        }
        SCHEMA_VERSION => debug!("Subtitle library schema is current (v{})", SCHEMA_VERSION),
        other => {
            return Err(anyhow!(
                "Unsupported subtitle library schema v{} (this build reads v{})",
                other,
                SCHEMA_VERSION
            ));
        }
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .ok();

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

fn create_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subtitles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL CHECK (kind IN ('video', 'music', 'series')),
            video_title TEXT,
            series TEXT,
            season INTEGER,
            episode INTEGER,
            music_title TEXT,
            language TEXT NOT NULL,
            filename TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_subtitles_hash ON subtitles(content_hash);
        CREATE INDEX IF NOT EXISTS idx_subtitles_filename ON subtitles(filename);

        CREATE TABLE IF NOT EXISTS segments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subtitle_id INTEGER NOT NULL REFERENCES subtitles(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            segment_number INTEGER NOT NULL,
            time_start REAL NOT NULL,
            time_end REAL NOT NULL,
            text TEXT NOT NULL,
            UNIQUE(subtitle_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_segments_subtitle ON segments(subtitle_id);
        "#,
    )?;

    Ok(())
}
