//! Error types for concept scheduling and storage.

use crate::models::ConceptId;

/// Rejected input: a bad quality grade or corrupt scheduling state.
///
/// Never retried. Seeing one of these means the caller or the stored data is wrong.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("quality {0} is outside 0..=5")]
    QualityOutOfRange(u8),

    #[error("revision interval {0} is below 1 day")]
    IntervalTooSmall(i32),

    #[error("easiness factor {0} is not a finite number >= 1.3")]
    CorruptEasiness(f64),

    #[error("repetition count {0} is negative")]
    NegativeRepetitions(i32),

    #[error("revision interval no longer fits in the calendar")]
    IntervalOverflow,

    #[error("concept name must not be empty")]
    EmptyName,
}

/// Failures raised by a concept store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("concept {0} not found")]
    NotFound(ConceptId),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Failures while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced by the review operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// Another writer updated the concept between load and save.
    #[error("concept {0} was modified concurrently")]
    StaleState(ConceptId),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(StorageError::Database(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
