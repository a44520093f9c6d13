//! Prefixed UUID v7 ID generation.
//!
//! Every row gets a time-ordered ID with an entity prefix, e.g.
//! `user-0190b5c0-...`, so IDs are self-describing in logs and URLs.

use uuid::Uuid;

/// Generate a prefixed UUID v7 ID.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::now_v7())
}

/// ID prefix for user rows.
pub const USER: &str = "user";
/// ID prefix for department rows.
pub const DEPARTMENT: &str = "dept";
/// ID prefix for department permission rows.
pub const PERMISSION: &str = "perm";
/// ID prefix for task rows.
pub const TASK: &str = "task";
/// ID prefix for task comment rows.
pub const COMMENT: &str = "comment";
/// ID prefix for notification rows.
pub const NOTIFICATION: &str = "notif";
/// ID prefix for planning rows.
pub const PLANNING: &str = "plan";
/// ID prefix for planning snapshot rows.
pub const SNAPSHOT: &str = "snap";
/// ID prefix for target rows.
pub const TARGET: &str = "target";
/// ID prefix for sale rows.
pub const SALE: &str = "sale";
/// ID prefix for return rows.
pub const RETURN: &str = "return";
/// ID prefix for activity log rows.
pub const ACTIVITY: &str = "act";

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_prefix() {
        let id = generate_id(TASK);
        assert!(id.starts_with("task-"));
    }

    #[test]
    fn ids_are_unique() {
        let a = generate_id(USER);
        let b = generate_id(USER);
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_time_ordered() {
        // UUID v7 sorts lexicographically by creation time.
        let a = generate_id(NOTIFICATION);
        let b = generate_id(NOTIFICATION);
        assert!(a < b);
    }
}
