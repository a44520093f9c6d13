//! Login flow.

use rusqlite::Connection;
use tracing::{info, warn};

use fieldops_core::OrgClock;
use fieldops_users::{ActivityLogRepository, User, UserRepository};

use crate::errors::{AuthError, Result};
use crate::password::verify_password;
use crate::tokens::issue_token;

/// Authentication service.
pub struct AuthService;

impl AuthService {
    /// Authenticate a username/password pair and issue a bearer token.
    ///
    /// Inactive accounts are rejected after the password check so the
    /// response does not reveal whether the password was right.
    pub fn login(
        conn: &Connection,
        clock: &OrgClock,
        secret: &str,
        ttl_hours: u64,
        username: &str,
        password: &str,
    ) -> Result<(String, User)> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "username and password are required".to_string(),
            ));
        }

        let Some(user) = UserRepository::get_by_username(conn, username)? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash)? {
            warn!(username, "login failed: bad password");
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            warn!(username, "login rejected: inactive account");
            return Err(AuthError::Inactive);
        }

        UserRepository::touch_last_login(conn, &user.id, &clock.now_iso())?;
        ActivityLogRepository::record(
            conn,
            &user.id,
            "login",
            Some(&format!("user logged in: {username}")),
            None,
        )?;

        let token = issue_token(secret, clock, &user.id, &user.username, user.role, ttl_hours)?;
        info!(user_id = %user.id, "login succeeded");
        Ok((token, user))
    }

    /// Change the caller's own password after verifying the current one.
    pub fn change_password(
        conn: &Connection,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(AuthError::Validation(
                "current and new password are required".to_string(),
            ));
        }
        if !verify_password(current_password, &user.password_hash)? {
            return Err(AuthError::Validation("current password is wrong".to_string()));
        }
        if new_password.len() < 6 {
            return Err(AuthError::Validation(
                "new password must be at least 6 characters".to_string(),
            ));
        }
        let hash = crate::password::hash_password(new_password)?;
        UserRepository::set_password_hash(conn, &user.id, &hash)?;
        ActivityLogRepository::record(conn, &user.id, "password_change", None, None)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::password::hash_password;
    use fieldops_core::Role;
    use fieldops_users::{UserCreateParams, UserRepository};

    const SECRET: &str = "test-secret";

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        fieldops_store::migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn create_user(conn: &Connection, username: &str, password: &str) -> User {
        UserRepository::create(
            conn,
            &UserCreateParams {
                username: username.to_string(),
                password_hash: hash_password(password).unwrap(),
                role: Some(Role::User),
                first_name: "Test".to_string(),
                last_name: username.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn login_succeeds_and_stamps_last_login() {
        let conn = setup_db();
        create_user(&conn, "kemal", "hunter22");
        let clock = OrgClock::default();

        let (token, user) =
            AuthService::login(&conn, &clock, SECRET, 24, "kemal", "hunter22").unwrap();
        assert!(!token.is_empty());

        let after = UserRepository::get(&conn, &user.id).unwrap().unwrap();
        assert!(after.last_login.is_some());
    }

    #[test]
    fn login_wrong_password_is_invalid_credentials() {
        let conn = setup_db();
        create_user(&conn, "kemal", "hunter22");
        let err = AuthService::login(&conn, &OrgClock::default(), SECRET, 24, "kemal", "nope")
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn login_unknown_user_is_invalid_credentials() {
        let conn = setup_db();
        let err = AuthService::login(&conn, &OrgClock::default(), SECRET, 24, "ghost", "x")
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn login_inactive_account_rejected() {
        let conn = setup_db();
        let user = create_user(&conn, "kemal", "hunter22");
        UserRepository::soft_delete(&conn, &user).unwrap();
        // Soft delete renames; look up by the anonymized username.
        let after = UserRepository::get(&conn, &user.id).unwrap().unwrap();
        let err = AuthService::login(
            &conn,
            &OrgClock::default(),
            SECRET,
            24,
            &after.username,
            "hunter22",
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::Inactive));
    }

    #[test]
    fn login_writes_activity_entry() {
        let conn = setup_db();
        create_user(&conn, "kemal", "hunter22");
        AuthService::login(&conn, &OrgClock::default(), SECRET, 24, "kemal", "hunter22").unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM activity_log WHERE action = 'login'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn change_password_requires_correct_current() {
        let conn = setup_db();
        let user = create_user(&conn, "kemal", "hunter22");
        let err =
            AuthService::change_password(&conn, &user, "wrong", "newpassword").unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[test]
    fn change_password_enforces_minimum_length() {
        let conn = setup_db();
        let user = create_user(&conn, "kemal", "hunter22");
        let err = AuthService::change_password(&conn, &user, "hunter22", "short").unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[test]
    fn change_password_rotates_hash() {
        let conn = setup_db();
        let user = create_user(&conn, "kemal", "hunter22");
        AuthService::change_password(&conn, &user, "hunter22", "new-password").unwrap();

        let err = AuthService::login(&conn, &OrgClock::default(), SECRET, 24, "kemal", "hunter22")
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        AuthService::login(&conn, &OrgClock::default(), SECRET, 24, "kemal", "new-password")
            .unwrap();
    }
}
