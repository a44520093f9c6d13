//! Task error types.

use thiserror::Error;

/// Errors from task operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// No task row with the given ID.
    #[error("task not found: {0}")]
    NotFound(String),

    /// Authorization or transition failure.
    #[error(transparent)]
    Access(#[from] fieldops_access::AccessError),

    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// A referenced user does not exist.
    #[error("assignee not found: {0}")]
    AssigneeNotFound(String),

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

impl TaskError {
    /// Build a [`TaskError::NotFound`].
    pub fn not_found(id: &str) -> Self {
        Self::NotFound(id.to_string())
    }
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, TaskError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
