/*!
 * Database module for the subtitle library.
 *
 * This module provides SQLite-based persistence for:
 * - Subtitle tracks with their media metadata
 * - Individual segments, searchable by text
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::Repository;
