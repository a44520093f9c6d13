//! Scope resolution: the set of user IDs whose records a principal may
//! access.
//!
//! Resolved fresh per request — department membership can change at any
//! time, so nothing here is cached. An [`Scope::Unrestricted`] admin is
//! deliberately distinct from a manager whose resolved member set is
//! empty: the former filters nothing, the latter sees nothing.

use std::collections::HashSet;

use rusqlite::Connection;

use fieldops_users::{User, UserRepository};

use crate::errors::Result;

/// The records a principal may read or write, by owning user ID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// No filter: every record is accessible.
    Unrestricted,
    /// Only records owned by these users are accessible. An empty set
    /// means no access at all.
    Members(HashSet<String>),
}

impl Scope {
    /// Whether the scope places no restriction.
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// Whether records owned by `user_id` are accessible.
    pub fn contains(&self, user_id: &str) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Members(members) => members.contains(user_id),
        }
    }

    /// Member IDs as a sorted vec for SQL `IN` clauses; `None` when
    /// unrestricted.
    pub fn member_ids(&self) -> Option<Vec<String>> {
        match self {
            Self::Unrestricted => None,
            Self::Members(members) => {
                let mut ids: Vec<String> = members.iter().cloned().collect();
                ids.sort();
                Some(ids)
            }
        }
    }
}

/// Compute the principal's scope.
///
/// - Admin: unrestricted.
/// - Department manager with a department: every member of that
///   department, self included.
/// - Department manager without a department: empty (no access).
/// - Plain user: only themselves.
pub fn resolve_scope(conn: &Connection, principal: &User) -> Result<Scope> {
    if principal.is_admin() {
        return Ok(Scope::Unrestricted);
    }
    if principal.is_department_manager() {
        let Some(department_id) = principal.department_id.as_deref() else {
            return Ok(Scope::Members(HashSet::new()));
        };
        let members = UserRepository::department_user_ids(conn, department_id)?;
        return Ok(Scope::Members(members.into_iter().collect()));
    }
    Ok(Scope::Members(HashSet::from([principal.id.clone()])))
}

/// Whether `target_user_id`'s records fall inside the principal's scope.
pub fn is_in_scope(conn: &Connection, principal: &User, target_user_id: &str) -> Result<bool> {
    Ok(resolve_scope(conn, principal)?.contains(target_user_id))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use fieldops_core::Role;
    use fieldops_users::{DepartmentCreateParams, DepartmentRepository, UserCreateParams,
        UserUpdateParams};

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        fieldops_store::migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn create_user(conn: &Connection, username: &str, role: Role) -> User {
        UserRepository::create(
            conn,
            &UserCreateParams {
                username: username.to_string(),
                password_hash: "x".to_string(),
                role: Some(role),
                first_name: "Test".to_string(),
                last_name: username.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn put_in_department(conn: &Connection, user_id: &str, department_id: &str) -> User {
        UserRepository::update(
            conn,
            user_id,
            &UserUpdateParams {
                department_id: Some(Some(department_id.to_string())),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap()
    }

    #[test]
    fn admin_is_unrestricted() {
        let conn = setup_db();
        let admin = create_user(&conn, "admin", Role::Admin);
        let scope = resolve_scope(&conn, &admin).unwrap();
        assert!(scope.is_unrestricted());
        assert!(scope.contains("user-anything"));
        assert!(scope.member_ids().is_none());
    }

    #[test]
    fn plain_user_scope_is_singleton() {
        let conn = setup_db();
        let user = create_user(&conn, "kemal", Role::User);
        let scope = resolve_scope(&conn, &user).unwrap();
        assert_eq!(scope, Scope::Members(HashSet::from([user.id.clone()])));
        assert!(scope.contains(&user.id));
        assert!(!scope.contains("user-other"));
    }

    #[test]
    fn manager_scope_covers_department_members() {
        let conn = setup_db();
        let dept = DepartmentRepository::create(
            &conn,
            &DepartmentCreateParams {
                name: "Sales".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let manager = create_user(&conn, "manager", Role::DepartmentManager);
        let manager = put_in_department(&conn, &manager.id, &dept.id);
        let member = create_user(&conn, "member", Role::User);
        let member = put_in_department(&conn, &member.id, &dept.id);
        let outsider = create_user(&conn, "outsider", Role::User);

        let scope = resolve_scope(&conn, &manager).unwrap();
        assert!(scope.contains(&manager.id));
        assert!(scope.contains(&member.id));
        assert!(!scope.contains(&outsider.id));
        assert_eq!(scope.member_ids().unwrap().len(), 2);
    }

    #[test]
    fn manager_without_department_sees_nothing() {
        let conn = setup_db();
        let manager = create_user(&conn, "floating", Role::DepartmentManager);
        let scope = resolve_scope(&conn, &manager).unwrap();
        assert_eq!(scope, Scope::Members(HashSet::new()));
        assert!(!scope.contains(&manager.id));
    }

    #[test]
    fn is_in_scope_matches_resolution() {
        let conn = setup_db();
        let admin = create_user(&conn, "admin", Role::Admin);
        let user = create_user(&conn, "kemal", Role::User);

        assert!(is_in_scope(&conn, &admin, &user.id).unwrap());
        assert!(is_in_scope(&conn, &user, &user.id).unwrap());
        assert!(!is_in_scope(&conn, &user, &admin.id).unwrap());
    }

    #[test]
    fn scope_reflects_membership_changes() {
        // No caching: moving a member out of the department changes the
        // next resolution.
        let conn = setup_db();
        let dept = DepartmentRepository::create(
            &conn,
            &DepartmentCreateParams {
                name: "Sales".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let manager = create_user(&conn, "manager", Role::DepartmentManager);
        let manager = put_in_department(&conn, &manager.id, &dept.id);
        let member = create_user(&conn, "member", Role::User);
        let member = put_in_department(&conn, &member.id, &dept.id);

        assert!(is_in_scope(&conn, &manager, &member.id).unwrap());

        UserRepository::update(
            &conn,
            &member.id,
            &UserUpdateParams {
                department_id: Some(None),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(!is_in_scope(&conn, &manager, &member.id).unwrap());
    }
}
