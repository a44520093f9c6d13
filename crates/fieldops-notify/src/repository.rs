//! SQL data access for notifications.

use rusqlite::{params, Connection, OptionalExtension, Row};

use fieldops_core::clock::TIMESTAMP_FORMAT;
use fieldops_core::{generate_id, ids};

use crate::errors::{NotifyError, Result};
use crate::types::{Notification, NotificationCreateParams};

/// Get current UTC timestamp as ISO 8601 string.
fn now_iso() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

const COLUMNS: &str = "id, to_user_id, created_by_id, title, message, url, entity_type, \
     entity_id, is_read, created_at, read_at";

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        to_user_id: row.get(1)?,
        created_by_id: row.get(2)?,
        title: row.get(3)?,
        message: row.get(4)?,
        url: row.get(5)?,
        entity_type: row.get(6)?,
        entity_id: row.get(7)?,
        is_read: row.get::<_, i64>(8)? != 0,
        created_at: row.get(9)?,
        read_at: row.get(10)?,
    })
}

/// Notification repository for SQL CRUD operations.
pub struct NotificationRepository;

impl NotificationRepository {
    /// Insert one notification.
    pub fn create(conn: &Connection, params: &NotificationCreateParams) -> Result<Notification> {
        let id = generate_id(ids::NOTIFICATION);
        let _ = conn.execute(
            "INSERT INTO notifications (id, to_user_id, created_by_id, title, message, url,
             entity_type, entity_id, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
            params![
                id,
                params.to_user_id,
                params.created_by_id,
                params.title,
                params.message,
                params.url,
                params.entity_type,
                params.entity_id,
                now_iso(),
            ],
        )?;
        Self::get(conn, &id)?.ok_or(NotifyError::NotFound(id))
    }

    /// Get a notification by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Notification>> {
        let notification = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM notifications WHERE id = ?1"),
                params![id],
                notification_from_row,
            )
            .optional()?;
        Ok(notification)
    }

    /// List a recipient's notifications, newest first, capped.
    pub fn list_for_user(
        conn: &Connection,
        user_id: &str,
        only_unread: bool,
        limit: u32,
    ) -> Result<Vec<Notification>> {
        let sql = if only_unread {
            format!(
                "SELECT {COLUMNS} FROM notifications
                 WHERE to_user_id = ?1 AND is_read = 0
                 ORDER BY created_at DESC, id DESC LIMIT ?2"
            )
        } else {
            format!(
                "SELECT {COLUMNS} FROM notifications
                 WHERE to_user_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2"
            )
        };
        let mut stmt = conn.prepare(&sql)?;
        let notifications = stmt
            .query_map(params![user_id, limit], notification_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notifications)
    }

    /// Count a recipient's unread notifications.
    pub fn unread_count(conn: &Connection, user_id: &str) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE to_user_id = ?1 AND is_read = 0",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Mark a recipient's notification read. Idempotent: a second call
    /// succeeds without touching `read_at`. Returns the row.
    pub fn mark_read(conn: &Connection, user_id: &str, id: &str) -> Result<Notification> {
        let notification = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM notifications WHERE id = ?1 AND to_user_id = ?2"),
                params![id, user_id],
                notification_from_row,
            )
            .optional()?
            .ok_or_else(|| NotifyError::NotFound(id.to_string()))?;

        if notification.is_read {
            return Ok(notification);
        }

        let _ = conn.execute(
            "UPDATE notifications SET is_read = 1, read_at = ?1 WHERE id = ?2",
            params![now_iso(), id],
        )?;
        Self::get(conn, id)?.ok_or_else(|| NotifyError::NotFound(id.to_string()))
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

    fn insert_user(conn: &Connection, username: &str) -> String {
        let id = generate_id(ids::USER);
        conn.execute(
            "INSERT INTO users (id, username, password_hash, first_name, last_name, created_at)
             VALUES (?1, ?2, 'x', 'Test', ?2, '2024-01-01T00:00:00Z')",
            params![id, username],
        )
        .unwrap();
        id
    }

    fn notify(conn: &Connection, to: &str, message: &str) -> Notification {
        NotificationRepository::create(
            conn,
            &NotificationCreateParams {
                to_user_id: to.to_string(),
                message: message.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn create_starts_unread() {
        let conn = setup_db();
        let user = insert_user(&conn, "kemal");
        let n = notify(&conn, &user, "hello");
        assert!(!n.is_read);
        assert!(n.read_at.is_none());
    }

    #[test]
    fn list_newest_first_respects_unread_filter() {
        let conn = setup_db();
        let user = insert_user(&conn, "kemal");
        let first = notify(&conn, &user, "first");
        notify(&conn, &user, "second");
        NotificationRepository::mark_read(&conn, &user, &first.id).unwrap();

        let all = NotificationRepository::list_for_user(&conn, &user, false, 50).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "second");

        let unread = NotificationRepository::list_for_user(&conn, &user, true, 50).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].message, "second");
    }

    #[test]
    fn unread_count_tracks_reads() {
        let conn = setup_db();
        let user = insert_user(&conn, "kemal");
        let n = notify(&conn, &user, "one");
        notify(&conn, &user, "two");
        assert_eq!(NotificationRepository::unread_count(&conn, &user).unwrap(), 2);

        NotificationRepository::mark_read(&conn, &user, &n.id).unwrap();
        assert_eq!(NotificationRepository::unread_count(&conn, &user).unwrap(), 1);
    }

    #[test]
    fn mark_read_is_idempotent() {
        let conn = setup_db();
        let user = insert_user(&conn, "kemal");
        let n = notify(&conn, &user, "hello");

        let read_once = NotificationRepository::mark_read(&conn, &user, &n.id).unwrap();
        assert!(read_once.is_read);
        let first_read_at = read_once.read_at.clone().unwrap();

        let read_twice = NotificationRepository::mark_read(&conn, &user, &n.id).unwrap();
        assert!(read_twice.is_read);
        assert_eq!(read_twice.read_at.as_deref(), Some(first_read_at.as_str()));
    }

    #[test]
    fn mark_read_scoped_to_recipient() {
        let conn = setup_db();
        let owner = insert_user(&conn, "owner");
        let other = insert_user(&conn, "other");
        let n = notify(&conn, &owner, "private");

        let err = NotificationRepository::mark_read(&conn, &other, &n.id).unwrap_err();
        assert!(matches!(err, NotifyError::NotFound(_)));
    }

    #[test]
    fn list_cap_applies() {
        let conn = setup_db();
        let user = insert_user(&conn, "kemal");
        for i in 0..5 {
            notify(&conn, &user, &format!("n{i}"));
        }
        let capped = NotificationRepository::list_for_user(&conn, &user, false, 3).unwrap();
        assert_eq!(capped.len(), 3);
    }
}
