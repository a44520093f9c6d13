//! Business logic for the directory.
//!
//! Wraps the repositories with validation and the cross-row rules:
//!
//! - Unique username/email/representative-code checks surface as
//!   conflicts instead of raw constraint failures.
//! - Assigning a department manager promotes the user's role (admins
//!   keep theirs); removing the last managed department demotes.
//! - Soft delete anonymizes; hard delete demands a reassignment target
//!   or an explicit purge when dependent rows exist, and never removes
//!   the last active admin.

use rusqlite::Connection;
use tracing::{info, warn};

use fieldops_core::Role;

use crate::errors::{Result, UsersError};
use crate::repository::{DepartmentRepository, UserRepository};
use crate::types::{
    Department, DepartmentCreateParams, DepartmentUpdateParams, DependentCounts, User,
    UserCreateParams, UserUpdateParams,
};

/// Directory service with business logic and validation.
pub struct DirectoryService;

impl DirectoryService {
    // ─────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────

    /// Create a user after uniqueness checks.
    pub fn create_user(conn: &Connection, params: &UserCreateParams) -> Result<User> {
        if params.username.trim().is_empty() {
            return Err(UsersError::Validation("username is required".to_string()));
        }
        if UserRepository::get_by_username(conn, &params.username)?.is_some() {
            return Err(UsersError::Conflict("username already taken".to_string()));
        }
        if let Some(email) = params.email.as_deref() {
            if UserRepository::get_by_email(conn, email)?.is_some() {
                return Err(UsersError::Conflict("email already taken".to_string()));
            }
        }
        if let Some(code) = params.representative_code.as_deref() {
            let exists: Option<String> = {
                use rusqlite::OptionalExtension;
                conn.query_row(
                    "SELECT id FROM users WHERE representative_code = ?1",
                    rusqlite::params![code],
                    |row| row.get(0),
                )
                .optional()?
            };
            if exists.is_some() {
                return Err(UsersError::Conflict(
                    "representative code already taken".to_string(),
                ));
            }
        }
        let user = UserRepository::create(conn, params)?;
        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Update a user. Changing the in-department title requires the
    /// actor to be admin or the manager of the user's department.
    pub fn update_user(
        conn: &Connection,
        actor: &User,
        user_id: &str,
        updates: &UserUpdateParams,
    ) -> Result<User> {
        let current = UserRepository::get(conn, user_id)?
            .ok_or_else(|| UsersError::UserNotFound(user_id.to_string()))?;

        if let Some(ref username) = updates.username {
            if username.trim().is_empty() {
                return Err(UsersError::Validation("username cannot be blank".to_string()));
            }
            if *username != current.username
                && UserRepository::get_by_username(conn, username)?.is_some()
            {
                return Err(UsersError::Conflict("username already taken".to_string()));
            }
        }

        if updates.department_role.is_some() {
            let allowed = actor.is_admin()
                || current
                    .department_id
                    .as_deref()
                    .is_some_and(|dept| actor.manages_department(dept));
            if !allowed {
                return Err(UsersError::Forbidden(
                    "not allowed to set the department title".to_string(),
                ));
            }
        }

        UserRepository::update(conn, user_id, updates)?
            .ok_or_else(|| UsersError::UserNotFound(user_id.to_string()))
    }

    /// Soft delete: deactivate and anonymize. Refuses self-deletion.
    pub fn soft_delete_user(conn: &Connection, actor: &User, user_id: &str) -> Result<()> {
        if actor.id == user_id {
            return Err(UsersError::Validation("cannot delete yourself".to_string()));
        }
        let user = UserRepository::get(conn, user_id)?
            .ok_or_else(|| UsersError::UserNotFound(user_id.to_string()))?;
        UserRepository::soft_delete(conn, &user)?;
        info!(user_id, "user soft-deleted");
        Ok(())
    }

    /// Count the rows that keep a user from being hard-deleted outright.
    pub fn dependent_counts(conn: &Connection, user_id: &str) -> Result<DependentCounts> {
        let count = |sql: &str| -> Result<i64> {
            Ok(conn.query_row(sql, rusqlite::params![user_id], |row| row.get(0))?)
        };
        Ok(DependentCounts {
            sales: count("SELECT COUNT(*) FROM sales WHERE representative_id = ?1")?,
            returns: count("SELECT COUNT(*) FROM returns WHERE representative_id = ?1")?,
            targets: count("SELECT COUNT(*) FROM targets WHERE user_id = ?1")?,
            tasks_created: count("SELECT COUNT(*) FROM tasks WHERE created_by_id = ?1")?,
            task_comments: count("SELECT COUNT(*) FROM task_comments WHERE user_id = ?1")?,
        })
    }

    /// Hard delete: permanently remove the user row.
    ///
    /// When dependent rows exist the caller must either name a
    /// `reassign_to` user (records move there) or pass `purge` (records
    /// are removed). Refuses self-deletion and the last active admin.
    /// Runs in one transaction.
    #[allow(clippy::too_many_lines)]
    pub fn hard_delete_user(
        conn: &Connection,
        actor: &User,
        user_id: &str,
        reassign_to: Option<&str>,
        purge: bool,
    ) -> Result<()> {
        if actor.id == user_id {
            return Err(UsersError::Validation("cannot delete yourself".to_string()));
        }
        let user = UserRepository::get(conn, user_id)?
            .ok_or_else(|| UsersError::UserNotFound(user_id.to_string()))?;
        if user.role == Role::Admin && UserRepository::count_active_admins(conn)? <= 1 {
            return Err(UsersError::LastActiveAdmin);
        }

        let counts = Self::dependent_counts(conn, user_id)?;
        let target = if counts.any() && !purge {
            let Some(target_id) = reassign_to else {
                return Err(UsersError::HasDependents { counts });
            };
            Some(
                UserRepository::get(conn, target_id)?
                    .ok_or_else(|| UsersError::UserNotFound(target_id.to_string()))?,
            )
        } else {
            None
        };

        let tx = conn.unchecked_transaction()?;

        if purge {
            let _ = tx.execute(
                "DELETE FROM sales WHERE representative_id = ?1",
                rusqlite::params![user_id],
            )?;
            let _ = tx.execute(
                "DELETE FROM returns WHERE representative_id = ?1",
                rusqlite::params![user_id],
            )?;
            let _ = tx.execute(
                "DELETE FROM targets WHERE user_id = ?1",
                rusqlite::params![user_id],
            )?;
            // Comments cascade with their tasks; author-only comments on
            // surviving tasks are removed explicitly.
            let _ = tx.execute(
                "DELETE FROM tasks WHERE created_by_id = ?1 OR assigned_by_id = ?1
                 OR assigned_to_id = ?1",
                rusqlite::params![user_id],
            )?;
            let _ = tx.execute(
                "DELETE FROM task_comments WHERE user_id = ?1",
                rusqlite::params![user_id],
            )?;
        } else if let Some(ref target) = target {
            let _ = tx.execute(
                "UPDATE sales SET representative_id = ?1 WHERE representative_id = ?2",
                rusqlite::params![target.id, user_id],
            )?;
            let _ = tx.execute(
                "UPDATE returns SET representative_id = ?1 WHERE representative_id = ?2",
                rusqlite::params![target.id, user_id],
            )?;
            let _ = tx.execute(
                "UPDATE targets SET user_id = ?1 WHERE user_id = ?2",
                rusqlite::params![target.id, user_id],
            )?;
            let _ = tx.execute(
                "UPDATE tasks SET created_by_id = ?1 WHERE created_by_id = ?2",
                rusqlite::params![target.id, user_id],
            )?;
            let _ = tx.execute(
                "UPDATE task_comments SET user_id = ?1 WHERE user_id = ?2",
                rusqlite::params![target.id, user_id],
            )?;
        }

        // Planning history is personal; it goes either way.
        let _ = tx.execute(
            "DELETE FROM planning WHERE representative_id = ?1",
            rusqlite::params![user_id],
        )?;
        let _ = tx.execute(
            "DELETE FROM planning_snapshots WHERE representative_id = ?1",
            rusqlite::params![user_id],
        )?;

        let _ = tx.execute(
            "DELETE FROM notifications WHERE to_user_id = ?1",
            rusqlite::params![user_id],
        )?;
        if purge {
            let _ = tx.execute(
                "DELETE FROM notifications WHERE created_by_id = ?1",
                rusqlite::params![user_id],
            )?;
        } else {
            let _ = tx.execute(
                "UPDATE notifications SET created_by_id = NULL WHERE created_by_id = ?1",
                rusqlite::params![user_id],
            )?;
            let _ = tx.execute(
                "UPDATE tasks SET assigned_by_id = NULL WHERE assigned_by_id = ?1",
                rusqlite::params![user_id],
            )?;
            let _ = tx.execute(
                "UPDATE tasks SET assigned_to_id = NULL WHERE assigned_to_id = ?1",
                rusqlite::params![user_id],
            )?;
        }

        let _ = tx.execute(
            "UPDATE departments SET manager_id = NULL WHERE manager_id = ?1",
            rusqlite::params![user_id],
        )?;
        let _ = tx.execute(
            "DELETE FROM activity_log WHERE user_id = ?1",
            rusqlite::params![user_id],
        )?;
        let _ = tx.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![user_id])?;

        tx.commit()?;
        warn!(user_id, purge, reassigned = target.is_some(), "user hard-deleted");
        Ok(())
    }

    /// Move all sales and return rows from one user to another.
    ///
    /// Department managers may only move records between members of
    /// their own department.
    pub fn reassign_records(
        conn: &Connection,
        actor: &User,
        from_user_id: &str,
        to_user_id: &str,
    ) -> Result<()> {
        if from_user_id == to_user_id {
            return Err(UsersError::Validation(
                "cannot reassign records to the same user".to_string(),
            ));
        }
        let from_user = UserRepository::get(conn, from_user_id)?
            .ok_or_else(|| UsersError::UserNotFound(from_user_id.to_string()))?;
        let to_user = UserRepository::get(conn, to_user_id)?
            .ok_or_else(|| UsersError::UserNotFound(to_user_id.to_string()))?;

        if actor.is_department_manager() {
            let own = actor.department_id.as_deref();
            if own.is_none()
                || from_user.department_id.as_deref() != own
                || to_user.department_id.as_deref() != own
            {
                return Err(UsersError::Forbidden(
                    "managers may only reassign within their department".to_string(),
                ));
            }
        }

        let tx = conn.unchecked_transaction()?;
        let _ = tx.execute(
            "UPDATE sales SET representative_id = ?1 WHERE representative_id = ?2",
            rusqlite::params![to_user.id, from_user.id],
        )?;
        let _ = tx.execute(
            "UPDATE returns SET representative_id = ?1 WHERE representative_id = ?2",
            rusqlite::params![to_user.id, from_user.id],
        )?;
        tx.commit()?;
        info!(from = %from_user.id, to = %to_user.id, "sales and return records reassigned");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Departments
    // ─────────────────────────────────────────────────────────────────────

    /// Create a department; assigning a manager promotes their role and
    /// pulls them into the department (admins keep their role).
    pub fn create_department(
        conn: &Connection,
        params: &DepartmentCreateParams,
    ) -> Result<Department> {
        if params.name.trim().is_empty() {
            return Err(UsersError::Validation("department name is required".to_string()));
        }
        if DepartmentRepository::get_by_name(conn, &params.name)?.is_some() {
            return Err(UsersError::Conflict("department name already taken".to_string()));
        }
        let department = DepartmentRepository::create(conn, params)?;
        if let Some(manager_id) = params.manager_id.as_deref() {
            Self::promote_manager(conn, manager_id, &department.id)?;
        }
        info!(department_id = %department.id, name = %department.name, "department created");
        Ok(department)
    }

    /// Update a department; manager changes promote the new manager and
    /// demote the old one when they manage nothing else.
    pub fn update_department(
        conn: &Connection,
        department_id: &str,
        updates: &DepartmentUpdateParams,
    ) -> Result<Department> {
        let current = DepartmentRepository::get(conn, department_id)?
            .ok_or_else(|| UsersError::DepartmentNotFound(department_id.to_string()))?;

        if let Some(ref name) = updates.name {
            if *name != current.name && DepartmentRepository::get_by_name(conn, name)?.is_some() {
                return Err(UsersError::Conflict("department name already taken".to_string()));
            }
        }

        let department = DepartmentRepository::update(conn, department_id, updates)?
            .ok_or_else(|| UsersError::DepartmentNotFound(department_id.to_string()))?;

        if let Some(ref new_manager) = updates.manager_id {
            let new_manager = new_manager.as_deref().filter(|s| !s.is_empty());
            if let Some(old_manager_id) = current.manager_id.as_deref() {
                if Some(old_manager_id) != new_manager {
                    Self::demote_manager_if_idle(conn, old_manager_id, department_id)?;
                }
            }
            if let Some(manager_id) = new_manager {
                Self::promote_manager(conn, manager_id, department_id)?;
            }
        }

        Ok(department)
    }

    /// Put a user into a department, optionally with a title.
    pub fn add_department_member(
        conn: &Connection,
        department_id: &str,
        user_id: &str,
        department_role: Option<&str>,
    ) -> Result<()> {
        let _ = DepartmentRepository::get(conn, department_id)?
            .ok_or_else(|| UsersError::DepartmentNotFound(department_id.to_string()))?;
        let updates = UserUpdateParams {
            department_id: Some(Some(department_id.to_string())),
            department_role: department_role.map(|r| Some(r.to_string())),
            ..Default::default()
        };
        let _ = UserRepository::update(conn, user_id, &updates)?
            .ok_or_else(|| UsersError::UserNotFound(user_id.to_string()))?;
        Ok(())
    }

    /// Take a user out of a department they are currently in.
    pub fn remove_department_member(
        conn: &Connection,
        department_id: &str,
        user_id: &str,
    ) -> Result<()> {
        let user = UserRepository::get(conn, user_id)?
            .ok_or_else(|| UsersError::UserNotFound(user_id.to_string()))?;
        if user.department_id.as_deref() != Some(department_id) {
            return Err(UsersError::Validation(
                "user is not a member of this department".to_string(),
            ));
        }
        let _ = UserRepository::update(
            conn,
            user_id,
            &UserUpdateParams {
                department_id: Some(None),
                ..Default::default()
            },
        )?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────

    fn promote_manager(conn: &Connection, manager_id: &str, department_id: &str) -> Result<()> {
        let manager = UserRepository::get(conn, manager_id)?
            .ok_or_else(|| UsersError::UserNotFound(manager_id.to_string()))?;
        if manager.role == Role::Admin {
            return Ok(());
        }
        let mut updates = UserUpdateParams {
            role: Some(Role::DepartmentManager),
            ..Default::default()
        };
        if manager.department_id.as_deref() != Some(department_id) {
            updates.department_id = Some(Some(department_id.to_string()));
        }
        let _ = UserRepository::update(conn, manager_id, &updates)?;
        Ok(())
    }

    fn demote_manager_if_idle(
        conn: &Connection,
        manager_id: &str,
        department_id: &str,
    ) -> Result<()> {
        let Some(old_manager) = UserRepository::get(conn, manager_id)? else {
            return Ok(());
        };
        if old_manager.role != Role::DepartmentManager {
            return Ok(());
        }
        if DepartmentRepository::count_managed_elsewhere(conn, manager_id, department_id)? == 0 {
            let _ = UserRepository::update(
                conn,
                manager_id,
                &UserUpdateParams {
                    role: Some(Role::User),
                    ..Default::default()
                },
            )?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
