//! SQL data access for users, departments, permissions, and the
//! activity log.
//!
//! All methods take a `&Connection` parameter and are stateless — pure
//! functions that translate between Rust types and SQL. IDs are
//! prefixed UUID v7 strings.

use rusqlite::{params, Connection, OptionalExtension, Row};

use fieldops_core::clock::TIMESTAMP_FORMAT;
use fieldops_core::permissions::{GranularActions, ModulePermission};
use fieldops_core::{generate_id, ids, Role};

use crate::errors::Result;
use crate::types::{
    ActivityEntry, Department, DepartmentCreateParams, DepartmentUpdateParams, PermissionEntry,
    User, UserCreateParams, UserUpdateParams,
};

/// Get current UTC timestamp as ISO 8601 string.
fn now_iso() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, first_name, last_name, \
     is_active, department_id, department_role, representative_code, phone, region, \
     last_login, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role_text: String = row.get(4)?;
    let role = Role::parse(&role_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role,
        first_name: row.get(5)?,
        last_name: row.get(6)?,
        is_active: row.get::<_, i64>(7)? != 0,
        department_id: row.get(8)?,
        department_role: row.get(9)?,
        representative_code: row.get(10)?,
        phone: row.get(11)?,
        region: row.get(12)?,
        last_login: row.get(13)?,
        created_at: row.get(14)?,
    })
}

const DEPARTMENT_COLUMNS: &str =
    "id, name, description, manager_id, is_active, default_role_title, created_at, updated_at";

fn department_from_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        manager_id: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
        default_role_title: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn permission_from_row(row: &Row<'_>) -> rusqlite::Result<ModulePermission> {
    let actions_json: Option<String> = row.get(6)?;
    let actions: Option<GranularActions> =
        actions_json.and_then(|json| serde_json::from_str(&json).ok());
    Ok(ModulePermission {
        id: row.get(0)?,
        department_id: row.get(1)?,
        module_name: row.get(2)?,
        can_view: row.get::<_, i64>(3)? != 0,
        can_edit: row.get::<_, i64>(4)? != 0,
        can_delete: row.get::<_, i64>(5)? != 0,
        actions,
        created_at: row.get(7)?,
    })
}

/// User repository for SQL CRUD operations.
pub struct UserRepository;

impl UserRepository {
    /// Create a new user.
    pub fn create(conn: &Connection, params: &UserCreateParams) -> Result<User> {
        let id = generate_id(ids::USER);
        let now = now_iso();
        let role = params.role.unwrap_or(Role::User);

        let _ = conn.execute(
            "INSERT INTO users (id, username, email, password_hash, role, first_name, last_name,
             is_active, department_id, department_role, representative_code, phone, region, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                id,
                params.username,
                params.email,
                params.password_hash,
                role.as_sql(),
                params.first_name,
                params.last_name,
                params.department_id,
                params.department_role,
                params.representative_code,
                params.phone,
                params.region,
                now,
            ],
        )?;

        Self::get(conn, &id)?.ok_or_else(|| crate::UsersError::UserNotFound(id))
    }

    /// Get a user by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<User>> {
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by unique username.
    pub fn get_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by unique email.
    pub fn get_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// List all users, newest first.
    pub fn list(conn: &Connection) -> Result<Vec<User>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// List the members of a department.
    pub fn list_by_department(conn: &Connection, department_id: &str) -> Result<Vec<User>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE department_id = ?1 ORDER BY username ASC"
        ))?;
        let users = stmt
            .query_map(params![department_id], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// IDs of every user in a department.
    pub fn department_user_ids(conn: &Connection, department_id: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT id FROM users WHERE department_id = ?1")?;
        let ids = stmt
            .query_map(params![department_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// All admins.
    pub fn admins(conn: &Connection) -> Result<Vec<User>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'admin'"
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// The department manager of the given department, if one exists.
    pub fn manager_of_department(
        conn: &Connection,
        department_id: &str,
    ) -> Result<Option<User>> {
        let user = conn
            .query_row(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE role = 'department_manager' AND department_id = ?1
                     ORDER BY created_at ASC LIMIT 1"
                ),
                params![department_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Count active admin accounts.
    pub fn count_active_admins(conn: &Connection) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Update a user. Returns the updated user, or `None` if not found.
    #[allow(clippy::too_many_lines)]
    pub fn update(
        conn: &Connection,
        id: &str,
        updates: &UserUpdateParams,
    ) -> Result<Option<User>> {
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref username) = updates.username {
            sets.push("username = ?".to_string());
            values.push(Box::new(username.clone()));
        }
        if let Some(ref email) = updates.email {
            sets.push("email = ?".to_string());
            values.push(Box::new(email.clone()));
        }
        if let Some(role) = updates.role {
            sets.push("role = ?".to_string());
            values.push(Box::new(role.as_sql().to_string()));
        }
        if let Some(ref first_name) = updates.first_name {
            sets.push("first_name = ?".to_string());
            values.push(Box::new(first_name.clone()));
        }
        if let Some(ref last_name) = updates.last_name {
            sets.push("last_name = ?".to_string());
            values.push(Box::new(last_name.clone()));
        }
        if let Some(is_active) = updates.is_active {
            sets.push("is_active = ?".to_string());
            values.push(Box::new(i64::from(is_active)));
        }
        if let Some(ref department_id) = updates.department_id {
            sets.push("department_id = ?".to_string());
            let normalized = department_id.clone().filter(|s| !s.is_empty());
            values.push(Box::new(normalized));
        }
        if let Some(ref department_role) = updates.department_role {
            sets.push("department_role = ?".to_string());
            values.push(Box::new(department_role.clone()));
        }
        if let Some(ref code) = updates.representative_code {
            sets.push("representative_code = ?".to_string());
            values.push(Box::new(code.clone()));
        }
        if let Some(ref phone) = updates.phone {
            sets.push("phone = ?".to_string());
            values.push(Box::new(phone.clone()));
        }
        if let Some(ref region) = updates.region {
            sets.push("region = ?".to_string());
            values.push(Box::new(region.clone()));
        }

        if sets.is_empty() {
            return Self::get(conn, id);
        }

        values.push(Box::new(id.to_string()));
        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let changed = conn.execute(&sql, params_refs.as_slice())?;
        if changed == 0 {
            return Ok(None);
        }
        Self::get(conn, id)
    }

    /// Replace the stored password hash.
    pub fn set_password_hash(conn: &Connection, id: &str, password_hash: &str) -> Result<()> {
        let _ = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, id],
        )?;
        Ok(())
    }

    /// Stamp the last successful login.
    pub fn touch_last_login(conn: &Connection, id: &str, at_iso: &str) -> Result<()> {
        let _ = conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![at_iso, id],
        )?;
        Ok(())
    }

    /// Soft delete: deactivate and anonymize identifying fields. The
    /// row and its dependent records stay in place; login is blocked.
    pub fn soft_delete(conn: &Connection, user: &User) -> Result<()> {
        let anonymized = format!("{}_deleted_{}", user.username, &user.id);
        let _ = conn.execute(
            "UPDATE users SET is_active = 0, username = ?1, email = NULL,
             representative_code = NULL WHERE id = ?2",
            params![anonymized, user.id],
        )?;
        Ok(())
    }

    /// Remove the row itself. Callers must have already detached or
    /// removed dependent records.
    pub fn delete_row(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

/// Department repository for SQL CRUD operations.
pub struct DepartmentRepository;

impl DepartmentRepository {
    /// Create a department.
    pub fn create(conn: &Connection, params: &DepartmentCreateParams) -> Result<Department> {
        let id = generate_id(ids::DEPARTMENT);
        let now = now_iso();
        let _ = conn.execute(
            "INSERT INTO departments (id, name, description, manager_id, is_active,
             default_role_title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?6)",
            params![
                id,
                params.name,
                params.description,
                params.manager_id,
                params.default_role_title,
                now,
            ],
        )?;
        Self::get(conn, &id)?.ok_or_else(|| crate::UsersError::DepartmentNotFound(id))
    }

    /// Get a department by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Department>> {
        let dept = conn
            .query_row(
                &format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = ?1"),
                params![id],
                department_from_row,
            )
            .optional()?;
        Ok(dept)
    }

    /// Get a department by unique name.
    pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Department>> {
        let dept = conn
            .query_row(
                &format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE name = ?1"),
                params![name],
                department_from_row,
            )
            .optional()?;
        Ok(dept)
    }

    /// List all departments ordered by name.
    pub fn list(conn: &Connection) -> Result<Vec<Department>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments ORDER BY name ASC"
        ))?;
        let depts = stmt
            .query_map([], department_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(depts)
    }

    /// Update a department. Returns the updated row, or `None` if not
    /// found.
    pub fn update(
        conn: &Connection,
        id: &str,
        updates: &DepartmentUpdateParams,
    ) -> Result<Option<Department>> {
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref name) = updates.name {
            sets.push("name = ?".to_string());
            values.push(Box::new(name.clone()));
        }
        if let Some(ref description) = updates.description {
            sets.push("description = ?".to_string());
            values.push(Box::new(description.clone()));
        }
        if let Some(ref manager_id) = updates.manager_id {
            sets.push("manager_id = ?".to_string());
            let normalized = manager_id.clone().filter(|s| !s.is_empty());
            values.push(Box::new(normalized));
        }
        if let Some(is_active) = updates.is_active {
            sets.push("is_active = ?".to_string());
            values.push(Box::new(i64::from(is_active)));
        }
        if let Some(ref title) = updates.default_role_title {
            sets.push("default_role_title = ?".to_string());
            values.push(Box::new(title.clone()));
        }

        if sets.is_empty() {
            return Self::get(conn, id);
        }

        sets.push("updated_at = ?".to_string());
        values.push(Box::new(now_iso()));
        values.push(Box::new(id.to_string()));

        let sql = format!("UPDATE departments SET {} WHERE id = ?", sets.join(", "));
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let changed = conn.execute(&sql, params_refs.as_slice())?;
        if changed == 0 {
            return Ok(None);
        }
        Self::get(conn, id)
    }

    /// Number of members in a department.
    pub fn user_count(conn: &Connection, id: &str) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE department_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count departments managed by the user, excluding one department.
    pub fn count_managed_elsewhere(
        conn: &Connection,
        manager_id: &str,
        except_department_id: &str,
    ) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM departments WHERE manager_id = ?1 AND id != ?2",
            params![manager_id, except_department_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Clear the manager reference wherever the user holds it.
    pub fn clear_manager(conn: &Connection, manager_id: &str) -> Result<()> {
        let _ = conn.execute(
            "UPDATE departments SET manager_id = NULL WHERE manager_id = ?1",
            params![manager_id],
        )?;
        Ok(())
    }
}

/// Department permission repository.
pub struct PermissionRepository;

impl PermissionRepository {
    /// Get the permission row for a department and module.
    pub fn get(
        conn: &Connection,
        department_id: &str,
        module_name: &str,
    ) -> Result<Option<ModulePermission>> {
        let perm = conn
            .query_row(
                "SELECT id, department_id, module_name, can_view, can_edit, can_delete,
                 actions, created_at
                 FROM department_permissions WHERE department_id = ?1 AND module_name = ?2",
                params![department_id, module_name],
                permission_from_row,
            )
            .optional()?;
        Ok(perm)
    }

    /// List all permission rows for a department.
    pub fn list(conn: &Connection, department_id: &str) -> Result<Vec<ModulePermission>> {
        let mut stmt = conn.prepare(
            "SELECT id, department_id, module_name, can_view, can_edit, can_delete,
             actions, created_at
             FROM department_permissions WHERE department_id = ?1 ORDER BY module_name ASC",
        )?;
        let perms = stmt
            .query_map(params![department_id], permission_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(perms)
    }

    /// Replace every permission row of a department with the given set.
    pub fn replace_all(
        conn: &Connection,
        department_id: &str,
        entries: &[PermissionEntry],
    ) -> Result<()> {
        let _ = conn.execute(
            "DELETE FROM department_permissions WHERE department_id = ?1",
            params![department_id],
        )?;
        let now = now_iso();
        for entry in entries {
            let actions_json = entry
                .actions
                .as_ref()
                .map(|a| serde_json::to_string(a).unwrap_or_else(|_| "{}".to_string()));
            let _ = conn.execute(
                "INSERT INTO department_permissions
                 (id, department_id, module_name, can_view, can_edit, can_delete, actions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    generate_id(ids::PERMISSION),
                    department_id,
                    entry.module_name.to_lowercase(),
                    i64::from(entry.can_view),
                    i64::from(entry.can_edit),
                    i64::from(entry.can_delete),
                    actions_json,
                    now,
                ],
            )?;
        }
        Ok(())
    }
}

/// Activity audit log repository.
pub struct ActivityLogRepository;

impl ActivityLogRepository {
    /// Append one audit entry.
    pub fn record(
        conn: &Connection,
        user_id: &str,
        action: &str,
        description: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO activity_log (id, user_id, action, description, ip_address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                generate_id(ids::ACTIVITY),
                user_id,
                action,
                description,
                ip_address,
                now_iso(),
            ],
        )?;
        Ok(())
    }

    /// List recent entries, newest first.
    pub fn list(conn: &Connection, limit: u32) -> Result<Vec<ActivityEntry>> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, action, description, ip_address, created_at
             FROM activity_log ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(ActivityEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    action: row.get(2)?,
                    description: row.get(3)?,
                    ip_address: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;

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
                password_hash: "$argon2id$stub".to_string(),
                role: Some(role),
                first_name: "Test".to_string(),
                last_name: username.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn create_and_get_user() {
        let conn = setup_db();
        let user = create_user(&conn, "kemal", Role::User);
        assert!(user.id.starts_with("user-"));
        assert!(user.is_active);

        let fetched = UserRepository::get(&conn, &user.id).unwrap().unwrap();
        assert_eq!(fetched.username, "kemal");
        assert_eq!(fetched.role, Role::User);
    }

    #[test]
    fn get_by_username() {
        let conn = setup_db();
        create_user(&conn, "aylin", Role::Admin);
        let user = UserRepository::get_by_username(&conn, "aylin").unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(UserRepository::get_by_username(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_rejected_by_schema() {
        let conn = setup_db();
        create_user(&conn, "kemal", Role::User);
        let duplicate = UserRepository::create(
            &conn,
            &UserCreateParams {
                username: "kemal".to_string(),
                password_hash: "x".to_string(),
                first_name: "K".to_string(),
                last_name: "A".to_string(),
                ..Default::default()
            },
        );
        assert!(duplicate.is_err());
    }

    #[test]
    fn update_user_dynamic_fields() {
        let conn = setup_db();
        let user = create_user(&conn, "kemal", Role::User);
        let updated = UserRepository::update(
            &conn,
            &user.id,
            &UserUpdateParams {
                role: Some(Role::DepartmentManager),
                phone: Some(Some("555-1234".to_string())),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.role, Role::DepartmentManager);
        assert_eq!(updated.phone.as_deref(), Some("555-1234"));
        assert!(!updated.is_active);
    }

    #[test]
    fn update_clears_department_with_inner_none() {
        let conn = setup_db();
        let dept = DepartmentRepository::create(
            &conn,
            &DepartmentCreateParams {
                name: "Sales".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let user = create_user(&conn, "kemal", Role::User);
        UserRepository::update(
            &conn,
            &user.id,
            &UserUpdateParams {
                department_id: Some(Some(dept.id.clone())),
                ..Default::default()
            },
        )
        .unwrap();

        let cleared = UserRepository::update(
            &conn,
            &user.id,
            &UserUpdateParams {
                department_id: Some(None),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert!(cleared.department_id.is_none());
    }

    #[test]
    fn update_missing_user_returns_none() {
        let conn = setup_db();
        let result = UserRepository::update(
            &conn,
            "user-missing",
            &UserUpdateParams {
                first_name: Some("X".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn soft_delete_anonymizes() {
        let conn = setup_db();
        let user = UserRepository::create(
            &conn,
            &UserCreateParams {
                username: "kemal".to_string(),
                email: Some("kemal@example.com".to_string()),
                password_hash: "x".to_string(),
                first_name: "Kemal".to_string(),
                last_name: "Aydin".to_string(),
                representative_code: Some("REP-7".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        UserRepository::soft_delete(&conn, &user).unwrap();
        let after = UserRepository::get(&conn, &user.id).unwrap().unwrap();
        assert!(!after.is_active);
        assert!(after.username.starts_with("kemal_deleted_"));
        assert!(after.email.is_none());
        assert!(after.representative_code.is_none());
    }

    #[test]
    fn admins_and_active_count() {
        let conn = setup_db();
        let a1 = create_user(&conn, "admin1", Role::Admin);
        create_user(&conn, "admin2", Role::Admin);
        create_user(&conn, "user1", Role::User);
        assert_eq!(UserRepository::admins(&conn).unwrap().len(), 2);
        assert_eq!(UserRepository::count_active_admins(&conn).unwrap(), 2);

        UserRepository::soft_delete(&conn, &a1).unwrap();
        assert_eq!(UserRepository::count_active_admins(&conn).unwrap(), 1);
    }

    #[test]
    fn manager_of_department_matches_role_and_membership() {
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
        UserRepository::update(
            &conn,
            &manager.id,
            &UserUpdateParams {
                department_id: Some(Some(dept.id.clone())),
                ..Default::default()
            },
        )
        .unwrap();
        create_user(&conn, "plain", Role::User);

        let found = UserRepository::manager_of_department(&conn, &dept.id).unwrap().unwrap();
        assert_eq!(found.id, manager.id);
        assert!(UserRepository::manager_of_department(&conn, "dept-none").unwrap().is_none());
    }

    #[test]
    fn department_name_unique() {
        let conn = setup_db();
        DepartmentRepository::create(
            &conn,
            &DepartmentCreateParams {
                name: "Sales".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let duplicate = DepartmentRepository::create(
            &conn,
            &DepartmentCreateParams {
                name: "Sales".to_string(),
                ..Default::default()
            },
        );
        assert!(duplicate.is_err());
    }

    #[test]
    fn permission_replace_all_and_get() {
        let conn = setup_db();
        let dept = DepartmentRepository::create(
            &conn,
            &DepartmentCreateParams {
                name: "Sales".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let entries: Vec<PermissionEntry> = serde_json::from_str(
            r#"[
                {"module_name": "Sales", "can_view": true, "can_edit": true},
                {"module_name": "planning", "actions": {"assign": true}}
            ]"#,
        )
        .unwrap();
        PermissionRepository::replace_all(&conn, &dept.id, &entries).unwrap();

        // Module names are lowercased on write.
        let sales = PermissionRepository::get(&conn, &dept.id, "sales").unwrap().unwrap();
        assert!(sales.can_edit);
        assert!(sales.actions.is_none());

        let planning = PermissionRepository::get(&conn, &dept.id, "planning").unwrap().unwrap();
        assert_eq!(planning.actions.unwrap().get("assign"), Some(true));

        // Replacing again wipes the old set.
        PermissionRepository::replace_all(&conn, &dept.id, &[]).unwrap();
        assert!(PermissionRepository::list(&conn, &dept.id).unwrap().is_empty());
    }

    #[test]
    fn activity_log_records_and_lists_newest_first() {
        let conn = setup_db();
        let user = create_user(&conn, "kemal", Role::User);
        ActivityLogRepository::record(&conn, &user.id, "login", Some("logged in"), None).unwrap();
        ActivityLogRepository::record(&conn, &user.id, "task_create", None, Some("10.0.0.1"))
            .unwrap();

        let entries = ActivityLogRepository::list(&conn, 10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "task_create");
        assert_eq!(entries[1].action, "login");
    }
}
