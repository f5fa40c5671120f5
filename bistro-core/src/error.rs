//! Error types for directory operations

use thiserror::Error;

/// Directory layer errors.
///
/// The core performs no retries of its own: store failures are always
/// raised, cache failures on best-effort paths are absorbed by the
/// caller (logged, never surfaced as the operation's result).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// Create violated the name-uniqueness condition. Recoverable by
    /// the caller: pick another name, or treat as an idempotent no-op.
    #[error("Restaurant already exists: {name}")]
    AlreadyExists { name: String },

    /// The requested restaurant is absent from the primary store.
    /// Distinguishable from "present but empty".
    #[error("Restaurant not found: {name}")]
    NotFound { name: String },

    /// A rating was accumulated but the mean-field write failed.
    /// Accumulation is durable; the displayed average may be stale
    /// until the next submission recomputes it.
    #[error("Rating for {name} accumulated but mean update failed: {reason}")]
    PartialFailure { name: String, reason: String },

    /// Any other primary-store failure. Surfaced to the caller,
    /// never retried here.
    #[error("Store error: {reason}")]
    Store { reason: String },

    /// Cache adapter failure. Only reaches callers on paths where
    /// absorption is not mandated.
    #[error("Cache error: {reason}")]
    Cache { reason: String },
}

/// Result type alias for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
