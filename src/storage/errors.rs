//! Storage Error Classification
//! Mission: Collapse driver failures into a small taxonomy handlers can act on

use rusqlite::ffi::ErrorCode;
use thiserror::Error;
use tracing::{debug, warn};

/// Classified storage outcome.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness or foreign-key rule rejected the write.
    #[error("constraint violation")]
    ConstraintViolation,
    /// No row matched.
    #[error("record not found")]
    NotFound,
    /// Connectivity, locking or timeout. Safe to retry.
    #[error("storage temporarily unavailable")]
    Transient,
    #[error("unexpected storage failure")]
    Unknown,
}

/// Classify a driver error and log its structured detail.
///
/// The log line is the only place driver messages ever appear.
pub fn classify(op: &str, err: &rusqlite::Error) -> StoreError {
    let kind = classify_error(err);

    match (kind, err) {
        (StoreError::NotFound, _) => {
            debug!(op, "No matching row");
        }
        (_, rusqlite::Error::SqliteFailure(failure, message)) => {
            warn!(
                op,
                classified = %kind,
                code = ?failure.code,
                extended_code = failure.extended_code,
                message = message.as_deref().unwrap_or_default(),
                "Storage error"
            );
        }
        _ => {
            warn!(op, classified = %kind, error = %err, "Storage error");
        }
    }

    kind
}

fn classify_error(err: &rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation => StoreError::ConstraintViolation,
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure
            | ErrorCode::CannotOpen
            | ErrorCode::OperationInterrupted
            | ErrorCode::FileLockingProtocolFailed => StoreError::Transient,
            _ => StoreError::Unknown,
        },
        other => classify_by_message(&other.to_string()),
    }
}

/// Best-effort fallback for errors that carry no SQLite result code.
fn classify_by_message(message: &str) -> StoreError {
    let message = message.to_ascii_lowercase();
    if message.contains("constraint failed") {
        StoreError::ConstraintViolation
    } else if message.contains("database is locked") || message.contains("database is busy") {
        StoreError::Transient
    } else {
        StoreError::Unknown
    }
}
