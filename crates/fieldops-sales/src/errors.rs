//! Sales error types.

use thiserror::Error;

/// Errors from sales, return, and target operations.
#[derive(Debug, Error)]
pub enum SalesError {
    /// No row with the given ID.
    #[error("{0} not found")]
    NotFound(String),

    /// A target already exists for the (user, year, month) tuple.
    #[error("a target already exists for this month")]
    DuplicateTarget,

    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// A stored value failed domain parsing.
    #[error(transparent)]
    Core(#[from] fieldops_core::CoreError),

    /// Directory lookup failed.
    #[error(transparent)]
    Users(#[from] fieldops_users::UsersError),

    /// SQL execution failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for sales operations.
pub type Result<T> = std::result::Result<T, SalesError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
