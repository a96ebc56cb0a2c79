use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A caller supplied a bad argument (unknown scope, zero-day window, …).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying store could not satisfy a read. Callers are expected to
    /// degrade to a zeroed fallback dataset rather than surface this to end
    /// users; the engine never retries.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Import error: {0}")]
    Import(String),
}

impl Error {
    /// Wrap a failed store query. Used at the analytics boundary so read-path
    /// failures surface as `DataUnavailable` rather than as raw DB errors.
    pub fn unavailable(e: impl fmt::Display) -> Self {
        Error::DataUnavailable(e.to_string())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Database(e.to_string())
    }
}

impl From<rusqlite_migration::Error> for Error {
    fn from(e: rusqlite_migration::Error) -> Self {
        Error::Migration(e.to_string())
    }
}

impl<E: fmt::Display> From<tokio_rusqlite::Error<E>> for Error {
    fn from(e: tokio_rusqlite::Error<E>) -> Self {
        Error::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
