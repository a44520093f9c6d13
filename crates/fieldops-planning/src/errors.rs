//! Planning error types.

use thiserror::Error;

/// Errors from planning operations.
#[derive(Debug, Error)]
pub enum PlanningError {
    /// The 24-hour edit window on a plan has closed.
    #[error("the plan can no longer be edited (24-hour window closed)")]
    EditWindowClosed,

    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// A stored value failed domain parsing.
    #[error(transparent)]
    Core(#[from] fieldops_core::CoreError),

    /// Task lookup failed while building a calendar view.
    #[error(transparent)]
    Tasks(#[from] fieldops_tasks::TaskError),

    /// Directory lookup failed.
    #[error(transparent)]
    Users(#[from] fieldops_users::UsersError),

    /// SQL execution failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for planning operations.
pub type Result<T> = std::result::Result<T, PlanningError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_window_display() {
        assert!(PlanningError::EditWindowClosed
            .to_string()
            .contains("24-hour window"));
    }
}
