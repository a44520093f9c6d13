//! Directory error types.

use thiserror::Error;

use crate::types::DependentCounts;

/// Errors from directory operations.
#[derive(Debug, Error)]
pub enum UsersError {
    /// No user row with the given ID.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// No department row with the given ID.
    #[error("department not found: {0}")]
    DepartmentNotFound(String),

    /// A unique key is already taken (username, email, department name).
    #[error("{0}")]
    Conflict(String),

    /// The caller may not perform this directory operation.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// The last active admin cannot be deleted.
    #[error("cannot delete the last active admin")]
    LastActiveAdmin,

    /// Hard delete refused: dependent rows exist and neither a
    /// reassignment target nor the purge flag was given.
    #[error("user has dependent records; reassign them or pass purge")]
    HasDependents {
        /// Per-table dependent row counts, for the error payload.
        counts: DependentCounts,
    },

    /// A stored value failed domain parsing.
    #[error(transparent)]
    Core(#[from] fieldops_core::CoreError),

    /// SQL execution failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for directory operations.
pub type Result<T> = std::result::Result<T, UsersError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
