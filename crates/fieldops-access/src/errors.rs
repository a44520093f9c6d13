//! Access error types.

use thiserror::Error;

/// Errors from authorization checks.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The principal is not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),

    /// The transition is not valid from the task's current status.
    #[error("{0}")]
    InvalidTransition(String),

    /// Directory lookup failed.
    #[error(transparent)]
    Users(#[from] fieldops_users::UsersError),

    /// SQL execution failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_display() {
        let err = AccessError::Forbidden("no access to this task".to_string());
        assert_eq!(err.to_string(), "no access to this task");
    }
}
