//! Error types for bz2db
//!
//! Classification failures are per-record and typed, so a caller can tell an
//! unclassifiable bug apart from a valid channel.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// bz2db error types
#[derive(Error, Debug)]
pub enum Error {
    /// The date precedes every train in the calendar
    #[error("No applicable release train for {date}: it precedes the first known train date")]
    NoApplicableTrain {
        /// Date that was looked up
        date: NaiveDate,
    },

    /// A branch number within the train's range matched none of its channels
    #[error("Branch {branch} does not match any channel of the train dated {train_date}\nThe release calendar is probably inconsistent.")]
    UnrecognizedChannelOffset {
        /// Train the branch was classified against
        train_date: NaiveDate,
        /// Parsed branch number
        branch: u32,
    },

    /// The date is not a train date of the calendar
    #[error("No release train dated {0}")]
    UnknownTrain(NaiveDate),

    /// `creation_time` does not start with a `YYYY-MM-DD` date
    #[error("Invalid creation time {0:?}: expected a leading YYYY-MM-DD date")]
    InvalidCreationTime(String),

    /// Calendar data could not be built
    #[error("Invalid release calendar: {0}")]
    InvalidCalendar(String),

    /// Bugzilla API request failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration value could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error (SQLite/Parquet/Arrow)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}
