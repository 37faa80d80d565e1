//! Error types for Tally
//!
//! Two layers:
//! - [`ValidationError`] describes a single bad record (malformed date, unknown
//!   schedule, ...). The recurrence engine recovers from these locally by
//!   skipping the record and reporting the reason.
//! - [`Error`] covers store and ambient failures. Store failures during a run
//!   are isolated per template; a failure to read the recurring set aborts the
//!   run.

use serde::Serialize;
use thiserror::Error;

/// A record-level data problem
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("malformed date '{value}' (expected YYYY-MM-DD)")]
    MalformedDate { value: String },

    #[error("malformed amount '{value}'")]
    MalformedAmount { value: String },

    #[error("negative amount {value}")]
    NegativeAmount { value: String },

    #[error("recurring expense has no schedule")]
    MissingSchedule,

    #[error("unknown recurring schedule '{value}'")]
    UnknownSchedule { value: String },

    #[error("next occurrence after {anchor} is outside the supported date range")]
    DateOutOfRange { anchor: String },

    #[error("{field} must not be empty")]
    EmptyField { field: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A conditional write lost a race with another run
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
