//! Error types
//!
//! The public service contracts swallow most of these (logging them and
//! returning a default), but the fallible variants of each operation return
//! them so callers can choose to surface a failure.

use thiserror::Error;

/// Key-value storage failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be (de)serialized.
    #[error("malformed stored value: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Timetable mutations.
#[derive(Error, Debug)]
pub enum TimetableError {
    #[error("Please fill all fields.")]
    MissingFields,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Remote assistant exchange failures.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("assistant unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("assistant returned HTTP {0}")]
    Status(u16),

    #[error("assistant reply could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("assistant reply carried no answer")]
    EmptyReply,
}

/// Legacy command parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unrecognized command: {0:?}")]
    Unrecognized(String),
}
