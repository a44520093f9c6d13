//! Recipient fan-out.
//!
//! A state-changing task action produces one notification row per
//! computed recipient. Recipients form a true set (a user is never
//! notified twice for one event) and the actor is always excluded —
//! nobody is notified of their own action.
//!
//! Fan-out is a best-effort secondary effect: it runs after the primary
//! mutation has committed, and the [`dispatch_task_event`] /
//! [`dispatch_read_receipt`] wrappers log and swallow failures instead
//! of surfacing them to the caller.

use std::collections::BTreeSet;

use rusqlite::Connection;
use tracing::warn;

use fieldops_tasks::Task;
use fieldops_users::{User, UserRepository};

use crate::errors::Result;
use crate::repository::NotificationRepository;
use crate::types::{Notification, NotificationCreateParams};

/// A task action that notifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskEvent {
    /// Task created (and possibly assigned).
    Created,
    /// Assignee approved the task.
    Approved,
    /// Assignee delivered the task.
    Delivered,
    /// Someone commented on the task.
    Commented,
}

/// Compute recipients and persist one notification per recipient.
///
/// Returns the created rows.
pub fn notify_task_event(
    conn: &Connection,
    task: &Task,
    event: TaskEvent,
    actor: &User,
) -> Result<Vec<Notification>> {
    let mut recipients: BTreeSet<String> = BTreeSet::new();

    match event {
        TaskEvent::Created => {
            if let Some(assignee) = task.assigned_to_id.as_deref() {
                let _ = recipients.insert(assignee.to_string());
            }
        }
        TaskEvent::Approved | TaskEvent::Delivered => {
            let _ = recipients.insert(task.created_by_id.clone());
        }
        TaskEvent::Commented => {
            if let Some(assignee) = task.assigned_to_id.as_deref() {
                let _ = recipients.insert(assignee.to_string());
            }
            let _ = recipients.insert(task.created_by_id.clone());
        }
    }

    if let Some(department_id) = task.department_id.as_deref() {
        if let Some(manager) = UserRepository::manager_of_department(conn, department_id)? {
            let _ = recipients.insert(manager.id);
        }
    }
    for admin in UserRepository::admins(conn)? {
        let _ = recipients.insert(admin.id);
    }

    // Self-exclusion is mandatory.
    let _ = recipients.remove(&actor.id);

    let actor_name = actor.full_name();
    let mut created = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let (title, message) = message_for(event, task, &actor_name, &recipient);
        let notification = NotificationRepository::create(
            conn,
            &NotificationCreateParams {
                to_user_id: recipient,
                created_by_id: Some(actor.id.clone()),
                title: Some(title),
                message,
                url: Some("/tasks".to_string()),
                entity_type: Some("task".to_string()),
                entity_id: Some(task.id.clone()),
            },
        )?;
        created.push(notification);
    }
    Ok(created)
}

/// Read receipt: tell the viewer's department manager and the admins
/// that a notification was viewed. The viewer is excluded.
pub fn notify_read_receipt(
    conn: &Connection,
    viewer: &User,
    viewed: &Notification,
) -> Result<Vec<Notification>> {
    let mut recipients: BTreeSet<String> = BTreeSet::new();

    if let Some(department_id) = viewer.department_id.as_deref() {
        if let Some(manager) = UserRepository::manager_of_department(conn, department_id)? {
            let _ = recipients.insert(manager.id);
        }
    }
    for admin in UserRepository::admins(conn)? {
        let _ = recipients.insert(admin.id);
    }
    let _ = recipients.remove(&viewer.id);

    let viewer_name = viewer.full_name();
    let message = match (viewed.entity_type.as_deref(), viewed.entity_id.as_deref()) {
        (Some("task"), Some(entity_id)) => {
            format!("{viewer_name} viewed a task notification ({entity_id})")
        }
        _ => format!("{viewer_name} viewed a notification"),
    };

    let mut created = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let notification = NotificationRepository::create(
            conn,
            &NotificationCreateParams {
                to_user_id: recipient,
                created_by_id: Some(viewer.id.clone()),
                title: Some("Notification Viewed".to_string()),
                message: message.clone(),
                url: viewed.url.clone().or_else(|| Some("/tasks".to_string())),
                entity_type: viewed.entity_type.clone(),
                entity_id: viewed.entity_id.clone(),
            },
        )?;
        created.push(notification);
    }
    Ok(created)
}

/// Best-effort wrapper around [`notify_task_event`]: failures are
/// logged, never propagated. Returns how many rows were written.
pub fn dispatch_task_event(
    conn: &Connection,
    task: &Task,
    event: TaskEvent,
    actor: &User,
) -> usize {
    match notify_task_event(conn, task, event, actor) {
        Ok(created) => created.len(),
        Err(error) => {
            warn!(task_id = %task.id, ?event, %error, "notification fan-out failed");
            0
        }
    }
}

/// Best-effort wrapper around [`notify_read_receipt`].
pub fn dispatch_read_receipt(conn: &Connection, viewer: &User, viewed: &Notification) -> usize {
    match notify_read_receipt(conn, viewer, viewed) {
        Ok(created) => created.len(),
        Err(error) => {
            warn!(notification_id = %viewed.id, %error, "read-receipt fan-out failed");
            0
        }
    }
}

fn message_for(
    event: TaskEvent,
    task: &Task,
    actor_name: &str,
    recipient: &str,
) -> (String, String) {
    match event {
        TaskEvent::Created => {
            if task.assigned_to_id.as_deref() == Some(recipient) {
                (
                    "New Task".to_string(),
                    format!("You have been assigned a new task: {}", task.title),
                )
            } else {
                (
                    "Task Created".to_string(),
                    format!("{actor_name} created a task: {}", task.title),
                )
            }
        }
        TaskEvent::Approved => (
            "Task Approved".to_string(),
            format!("{actor_name} approved a task: {}", task.title),
        ),
        TaskEvent::Delivered => (
            "Task Delivered".to_string(),
            format!("{actor_name} delivered a task: {}", task.title),
        ),
        TaskEvent::Commented => (
            "Task Comment".to_string(),
            format!("{actor_name} commented on a task: {}", task.title),
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use fieldops_core::Role;
    use fieldops_tasks::{TaskCreateRequest, TaskService};
    use fieldops_users::{
        DepartmentCreateParams, DepartmentRepository, UserCreateParams, UserUpdateParams,
    };

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

    fn make_task(conn: &Connection, actor: &User, assignee: Option<&str>) -> Task {
        let request = TaskCreateRequest {
            title: "Visit the Kadikoy branch".to_string(),
            assigned_to_ids: assignee.map(ToString::to_string).into_iter().collect(),
            ..Default::default()
        };
        TaskService::create(conn, actor, &request).unwrap().remove(0)
    }

    #[test]
    fn created_event_notifies_assignee_and_admins_not_actor() {
        let conn = setup_db();
        let admin = create_user(&conn, "admin", Role::Admin);
        let other_admin = create_user(&conn, "admin2", Role::Admin);
        let rep = create_user(&conn, "rep", Role::User);
        let task = make_task(&conn, &admin, Some(&rep.id));

        let created = notify_task_event(&conn, &task, TaskEvent::Created, &admin).unwrap();
        let recipients: Vec<&str> = created.iter().map(|n| n.to_user_id.as_str()).collect();

        assert!(recipients.contains(&rep.id.as_str()));
        assert!(recipients.contains(&other_admin.id.as_str()));
        // The acting admin never notifies themselves.
        assert!(!recipients.contains(&admin.id.as_str()));
        // Exactly one row per recipient.
        assert_eq!(created.len(), 2);
    }

    #[test]
    fn assignee_gets_assignment_wording() {
        let conn = setup_db();
        let admin = create_user(&conn, "admin", Role::Admin);
        let rep = create_user(&conn, "rep", Role::User);
        let task = make_task(&conn, &admin, Some(&rep.id));

        let created = notify_task_event(&conn, &task, TaskEvent::Created, &admin).unwrap();
        let to_rep = created.iter().find(|n| n.to_user_id == rep.id).unwrap();
        assert_eq!(to_rep.title.as_deref(), Some("New Task"));
        assert!(to_rep.message.contains("assigned a new task"));
        assert_eq!(to_rep.entity_type.as_deref(), Some("task"));
        assert_eq!(to_rep.entity_id.as_deref(), Some(task.id.as_str()));
    }

    #[test]
    fn approved_event_notifies_creator_manager_and_other_admins() {
        let conn = setup_db();
        let dept = DepartmentRepository::create(
            &conn,
            &DepartmentCreateParams {
                name: "Sales".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let admin = create_user(&conn, "admin", Role::Admin);
        let manager = create_user(&conn, "manager", Role::DepartmentManager);
        let manager = put_in_department(&conn, &manager.id, &dept.id);
        let creator = create_user(&conn, "creator", Role::User);
        let creator = put_in_department(&conn, &creator.id, &dept.id);
        let rep = create_user(&conn, "rep", Role::User);
        let rep = put_in_department(&conn, &rep.id, &dept.id);

        let task = make_task(&conn, &creator, Some(&rep.id));
        let created = notify_task_event(&conn, &task, TaskEvent::Approved, &rep).unwrap();
        let recipients: BTreeSet<&str> =
            created.iter().map(|n| n.to_user_id.as_str()).collect();

        assert!(recipients.contains(creator.id.as_str()));
        assert!(recipients.contains(manager.id.as_str()));
        assert!(recipients.contains(admin.id.as_str()));
        assert!(!recipients.contains(rep.id.as_str()));
        assert_eq!(created.len(), 3);
    }

    #[test]
    fn recipients_are_deduplicated() {
        // Creator is also the department manager: one notification only.
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
        let rep = create_user(&conn, "rep", Role::User);
        let rep = put_in_department(&conn, &rep.id, &dept.id);

        let task = make_task(&conn, &manager, Some(&rep.id));
        let created = notify_task_event(&conn, &task, TaskEvent::Approved, &rep).unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].to_user_id, manager.id);
    }

    #[test]
    fn commented_event_includes_assignee_and_creator() {
        let conn = setup_db();
        let creator = create_user(&conn, "creator", Role::User);
        let rep = create_user(&conn, "rep", Role::User);
        let commenter = create_user(&conn, "commenter", Role::Admin);

        let task = make_task(&conn, &creator, Some(&rep.id));
        let created = notify_task_event(&conn, &task, TaskEvent::Commented, &commenter).unwrap();
        let recipients: BTreeSet<&str> =
            created.iter().map(|n| n.to_user_id.as_str()).collect();
        assert!(recipients.contains(creator.id.as_str()));
        assert!(recipients.contains(rep.id.as_str()));
        assert!(!recipients.contains(commenter.id.as_str()));
    }

    #[test]
    fn read_receipt_goes_to_manager_and_admins() {
        let conn = setup_db();
        let dept = DepartmentRepository::create(
            &conn,
            &DepartmentCreateParams {
                name: "Sales".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let admin = create_user(&conn, "admin", Role::Admin);
        let manager = create_user(&conn, "manager", Role::DepartmentManager);
        let manager = put_in_department(&conn, &manager.id, &dept.id);
        let rep = create_user(&conn, "rep", Role::User);
        let rep = put_in_department(&conn, &rep.id, &dept.id);

        let viewed = NotificationRepository::create(
            &conn,
            &NotificationCreateParams {
                to_user_id: rep.id.clone(),
                message: "something happened".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let receipts = notify_read_receipt(&conn, &rep, &viewed).unwrap();
        let recipients: BTreeSet<&str> =
            receipts.iter().map(|n| n.to_user_id.as_str()).collect();
        assert!(recipients.contains(manager.id.as_str()));
        assert!(recipients.contains(admin.id.as_str()));
        assert!(!recipients.contains(rep.id.as_str()));
    }

    #[test]
    fn dispatch_swallows_failures() {
        let conn = setup_db();
        let admin = create_user(&conn, "admin", Role::Admin);
        let rep = create_user(&conn, "rep", Role::User);
        let task = make_task(&conn, &admin, Some(&rep.id));

        // Dropping the table makes the insert fail; dispatch reports 0
        // instead of erroring.
        conn.execute_batch("DROP TABLE notifications;").unwrap();
        let written = dispatch_task_event(&conn, &task, TaskEvent::Created, &admin);
        assert_eq!(written, 0);
    }
}
