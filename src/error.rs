//! Crate error type.
//!
//! Data-integrity problems abort a run before the search starts; an
//! individual session that cannot be placed is never an error.

use thiserror::Error;

use crate::models::VersionStatus;
use crate::validation::ValidationError;

/// Errors surfaced by the timetabling engine and its gateways.
#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found or could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported session duration: {0} units (supported: 2, 3, 4)")]
    UnsupportedDuration(u8),

    #[error("data integrity check failed with {} problem(s): {}", .0.len(), summarize(.0))]
    DataIntegrity(Vec<ValidationError>),

    #[error("schedule version {0} does not exist")]
    VersionNotFound(u32),

    #[error("schedule version {version_id} is {status}, only draft versions can be computed or repaired")]
    VersionNotDraft { version_id: u32, status: VersionStatus },

    #[error("invalid algorithm configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown session: {0}")]
    UnknownSession(u32),

    #[error("unknown room: {0}")]
    UnknownRoom(String),

    #[error("store write failed: {0}")]
    Store(String),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
