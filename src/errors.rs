/*!
 * Error types for the subclean application.
 *
 * The subtitle core (parser, rule configuration) returns the typed errors
 * defined here; application glue works with `anyhow` and converts into
 * `AppError` at the edges, using the thiserror crate for ergonomic
 * error definitions.
 */

use thiserror::Error;

/// Errors raised while parsing the SRT interchange format.
///
/// Block numbers are 1-based positions in the input, not the index line
/// written inside the block.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// A block has an index line but no timing line
    #[error("Block {block}: missing timing line")]
    MissingTimingLine { block: usize },

    /// The index line is not a positive integer
    #[error("Block {block}: invalid index '{value}'")]
    InvalidIndex { block: usize, value: String },

    /// A timestamp does not match HH:MM:SS,mmm
    #[error("Block {block}: invalid timestamp '{value}'")]
    InvalidTimestamp { block: usize, value: String },

    /// The timing line is not of the form `start --> end`
    #[error("Block {block}: invalid time range '{value}'")]
    InvalidTimeRange { block: usize, value: String },
}

/// Errors in user supplied configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required QC threshold is absent
    #[error("Missing required threshold: {key}")]
    MissingThreshold { key: String },

    /// A QC threshold is present but unusable
    #[error("Invalid value for threshold {key}: {value}")]
    InvalidThreshold { key: String, value: String },

    /// A language code that isolang does not recognise
    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),

    /// Track metadata is incomplete for its kind
    #[error("Invalid track metadata: {0}")]
    InvalidMetadata(String),
}

/// Errors raised by the persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// The underlying SQLite call failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A lookup by id found nothing
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

/// Errors raised when driving the external media tool
#[derive(Error, Debug)]
pub enum MediaError {
    /// The tool could not be spawned at all
    #[error("Failed to run {tool}: {message}")]
    Spawn { tool: String, message: String },

    /// The tool ran but reported failure
    #[error("{tool} failed: {stderr}")]
    Failed { tool: String, stderr: String },

    /// The tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: String, secs: u64 },

    /// The clip range is empty or inverted
    #[error("Invalid clip range: {start:.3}s -> {end:.3}s")]
    InvalidRange { start: f64, end: f64 },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from subtitle parsing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the persistence layer
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Error from the media tool
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
