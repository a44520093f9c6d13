//! Notification error types.

use thiserror::Error;

/// Errors from notification operations.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No notification with the given ID for the given recipient.
    #[error("notification not found: {0}")]
    NotFound(String),

    /// Directory lookup failed.
    #[error(transparent)]
    Users(#[from] fieldops_users::UsersError),

    /// SQL execution failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = NotifyError::NotFound("notif-1".to_string());
        assert_eq!(err.to_string(), "notification not found: notif-1");
    }
}
