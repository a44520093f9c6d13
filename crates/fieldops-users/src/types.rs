//! Directory row types and parameter structs.

use serde::{Deserialize, Serialize};

use fieldops_core::Role;

/// A principal: one user row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    /// Row ID (`user-` prefix).
    pub id: String,
    /// Unique login name.
    pub username: String,
    /// Optional unique email.
    pub email: Option<String>,
    /// Argon2 PHC hash; never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// System role.
    pub role: Role,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Inactive users cannot authenticate or act.
    pub is_active: bool,
    /// Department membership, at most one.
    pub department_id: Option<String>,
    /// Free-text title inside the department.
    pub department_role: Option<String>,
    /// Unique representative code, when the user is a field rep.
    pub representative_code: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Sales region.
    pub region: Option<String>,
    /// Last successful login timestamp.
    pub last_login: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl User {
    /// Display name, falling back to the username when both name parts
    /// are blank.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Whether the user holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the user holds the department manager role.
    pub fn is_department_manager(&self) -> bool {
        self.role == Role::DepartmentManager
    }

    /// Whether the user manages the given department.
    pub fn manages_department(&self, department_id: &str) -> bool {
        self.is_department_manager() && self.department_id.as_deref() == Some(department_id)
    }
}

/// One department row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Department {
    /// Row ID (`dept-` prefix).
    pub id: String,
    /// Unique name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// The managing user, when assigned.
    pub manager_id: Option<String>,
    /// Inactive departments are hidden from pickers.
    pub is_active: bool,
    /// Default in-department title for new members.
    pub default_role_title: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// One audit log row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Row ID (`act-` prefix).
    pub id: String,
    /// Acting user.
    pub user_id: String,
    /// Short action code, e.g. `login`, `task_create`.
    pub action: String,
    /// Optional human-readable detail.
    pub description: Option<String>,
    /// Remote address when known.
    pub ip_address: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// Parameters for creating a user.
#[derive(Clone, Debug, Default)]
pub struct UserCreateParams {
    /// Unique login name.
    pub username: String,
    /// Optional unique email.
    pub email: Option<String>,
    /// Pre-hashed password.
    pub password_hash: String,
    /// System role; `None` defaults to [`Role::User`].
    pub role: Option<Role>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Department membership.
    pub department_id: Option<String>,
    /// In-department title.
    pub department_role: Option<String>,
    /// Representative code.
    pub representative_code: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Sales region.
    pub region: Option<String>,
}

/// Partial update for a user. `None` leaves the field untouched; the
/// inner `Option` of double-option fields distinguishes "set to null".
#[derive(Clone, Debug, Default)]
pub struct UserUpdateParams {
    /// New login name.
    pub username: Option<String>,
    /// New email (inner `None` clears).
    pub email: Option<Option<String>>,
    /// New system role.
    pub role: Option<Role>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
    /// New department (inner `None` clears).
    pub department_id: Option<Option<String>>,
    /// New in-department title (inner `None` clears).
    pub department_role: Option<Option<String>>,
    /// New representative code (inner `None` clears).
    pub representative_code: Option<Option<String>>,
    /// New phone (inner `None` clears).
    pub phone: Option<Option<String>>,
    /// New region (inner `None` clears).
    pub region: Option<Option<String>>,
}

/// Parameters for creating a department.
#[derive(Clone, Debug, Default)]
pub struct DepartmentCreateParams {
    /// Unique name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Manager to assign; promoted to department manager unless admin.
    pub manager_id: Option<String>,
    /// Default in-department title.
    pub default_role_title: Option<String>,
}

/// Partial update for a department.
#[derive(Clone, Debug, Default)]
pub struct DepartmentUpdateParams {
    /// New unique name.
    pub name: Option<String>,
    /// New description (inner `None` clears).
    pub description: Option<Option<String>>,
    /// New manager (inner `None` clears); role promotion/demotion rules
    /// apply.
    pub manager_id: Option<Option<String>>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
    /// New default title (inner `None` clears).
    pub default_role_title: Option<Option<String>>,
}

/// Entry used when replacing a department's permission set.
#[derive(Clone, Debug, Deserialize)]
pub struct PermissionEntry {
    /// Module name; lowercased on write. `*` is the wildcard.
    pub module_name: String,
    /// Legacy read flag.
    #[serde(default = "default_true")]
    pub can_view: bool,
    /// Legacy write flag.
    #[serde(default)]
    pub can_edit: bool,
    /// Legacy delete flag.
    #[serde(default)]
    pub can_delete: bool,
    /// Granular capability map.
    #[serde(default)]
    pub actions: Option<fieldops_core::GranularActions>,
}

fn default_true() -> bool {
    true
}

/// Per-table dependent row counts reported when a hard delete is
/// refused.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct DependentCounts {
    /// Sales rows owned by the user.
    pub sales: i64,
    /// Return rows owned by the user.
    pub returns: i64,
    /// Target rows for the user.
    pub targets: i64,
    /// Tasks created by the user.
    pub tasks_created: i64,
    /// Task comments authored by the user.
    pub task_comments: i64,
}

impl DependentCounts {
    /// Whether any dependent rows exist.
    pub fn any(&self) -> bool {
        self.sales + self.returns + self.targets + self.tasks_created + self.task_comments > 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "user-1".to_string(),
            username: "kemal".to_string(),
            email: None,
            password_hash: "$argon2id$...".to_string(),
            role: Role::User,
            first_name: "Kemal".to_string(),
            last_name: "Aydin".to_string(),
            is_active: true,
            department_id: Some("dept-1".to_string()),
            department_role: None,
            representative_code: None,
            phone: None,
            region: None,
            last_login: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn full_name_joins_parts() {
        assert_eq!(user().full_name(), "Kemal Aydin");
    }

    #[test]
    fn full_name_falls_back_to_username() {
        let mut u = user();
        u.first_name = String::new();
        u.last_name = "  ".to_string();
        assert_eq!(u.full_name(), "kemal");
    }

    #[test]
    fn manages_department_requires_role_and_membership() {
        let mut u = user();
        assert!(!u.manages_department("dept-1"));
        u.role = Role::DepartmentManager;
        assert!(u.manages_department("dept-1"));
        assert!(!u.manages_department("dept-2"));
    }

    #[test]
    fn password_hash_not_serialized() {
        let json = serde_json::to_string(&user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn dependent_counts_any() {
        let mut counts = DependentCounts::default();
        assert!(!counts.any());
        counts.targets = 1;
        assert!(counts.any());
    }
}
