//! SQL data access for tasks and comments.
//!
//! All methods take a `&Connection` parameter and are stateless — pure
//! functions that translate between Rust types and SQL. Dates are
//! stored as `YYYY-MM-DD` text, which compares correctly in SQL.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use fieldops_core::clock::{DATE_FORMAT, TIMESTAMP_FORMAT};
use fieldops_core::{generate_id, ids, Recurrence, TaskPriority, TaskStatus};

use crate::errors::{Result, TaskError};
use crate::types::{CommentView, Task, TaskCreateParams, TaskFilter, TaskUpdateParams,
    TaskVisibility};

/// Get current UTC timestamp as ISO 8601 string.
fn now_iso() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_from_sql(idx: usize, value: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()
}

const TASK_COLUMNS: &str = "id, title, description, department_id, assigned_by_id, \
     assigned_to_id, created_by_id, status, priority, start_date, due_date, is_recurring, \
     recurrence, created_at, updated_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status_text: String = row.get(7)?;
    let status = TaskStatus::parse(&status_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let priority_text: String = row.get(8)?;
    let priority = TaskPriority::parse(&priority_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let recurrence_text: String = row.get(12)?;
    let recurrence = Recurrence::parse(&recurrence_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(12, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        department_id: row.get(3)?,
        assigned_by_id: row.get(4)?,
        assigned_to_id: row.get(5)?,
        created_by_id: row.get(6)?,
        status,
        priority,
        start_date: date_from_sql(9, row.get(9)?)?,
        due_date: date_from_sql(10, row.get(10)?)?,
        is_recurring: row.get::<_, i64>(11)? != 0,
        recurrence,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn push_visibility(
    visibility: &TaskVisibility,
    conditions: &mut Vec<String>,
    values: &mut Vec<Box<dyn rusqlite::types::ToSql>>,
) {
    match visibility {
        TaskVisibility::All => {}
        TaskVisibility::DepartmentOrSelf {
            department_id: Some(department_id),
            user_id,
        } => {
            conditions
                .push("(department_id = ? OR assigned_to_id = ? OR created_by_id = ?)".to_string());
            values.push(Box::new(department_id.clone()));
            values.push(Box::new(user_id.clone()));
            values.push(Box::new(user_id.clone()));
        }
        TaskVisibility::DepartmentOrSelf {
            department_id: None,
            user_id,
        }
        | TaskVisibility::SelfOnly { user_id } => {
            conditions.push("(assigned_to_id = ? OR created_by_id = ?)".to_string());
            values.push(Box::new(user_id.clone()));
            values.push(Box::new(user_id.clone()));
        }
    }
}

/// Per-assignee task counters for the archive view.
#[derive(Clone, Copy, Debug, serde::Serialize)]
pub struct AssigneeStats {
    /// Tasks assigned to the user.
    pub total: i64,
    /// Completed.
    pub completed: i64,
    /// In progress.
    pub in_progress: i64,
    /// Pending or requested.
    pub pending: i64,
    /// Open past their due date.
    pub overdue: i64,
    /// Completed share of total, as a percentage.
    pub completion_rate: f64,
}

/// Task repository for SQL CRUD operations.
pub struct TaskRepository;

impl TaskRepository {
    // ─────────────────────────────────────────────────────────────────────
    // Task CRUD
    // ─────────────────────────────────────────────────────────────────────

    /// Create a new task.
    pub fn create(conn: &Connection, params: &TaskCreateParams) -> Result<Task> {
        let id = generate_id(ids::TASK);
        let now = now_iso();
        let status = params.status.unwrap_or(TaskStatus::Pending);
        let priority = params.priority.unwrap_or(TaskPriority::Normal);
        let recurrence = params.recurrence.unwrap_or_default();

        // Normalize empty strings to None for FK columns.
        let department_id = params.department_id.as_deref().filter(|s| !s.is_empty());
        let assigned_by_id = params.assigned_by_id.as_deref().filter(|s| !s.is_empty());
        let assigned_to_id = params.assigned_to_id.as_deref().filter(|s| !s.is_empty());

        let _ = conn.execute(
            "INSERT INTO tasks (id, title, description, department_id, assigned_by_id,
             assigned_to_id, created_by_id, status, priority, start_date, due_date,
             is_recurring, recurrence, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
            params![
                id,
                params.title,
                params.description,
                department_id,
                assigned_by_id,
                assigned_to_id,
                params.created_by_id,
                status.as_sql(),
                priority.as_sql(),
                params.start_date.map(date_to_sql),
                params.due_date.map(date_to_sql),
                i64::from(params.is_recurring),
                recurrence.as_sql(),
                now,
            ],
        )?;

        Self::get(conn, &id)?.ok_or_else(|| TaskError::not_found(&id))
    }

    /// Get a task by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Task>> {
        let task = conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    /// List tasks visible under the given rule, with filters. Ordered
    /// by due date (nulls last), then newest first.
    pub fn list(
        conn: &Connection,
        visibility: &TaskVisibility,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        push_visibility(visibility, &mut conditions, &mut values);

        if !filter.statuses.is_empty() {
            let placeholders = vec!["?"; filter.statuses.len()].join(", ");
            conditions.push(format!("status IN ({placeholders})"));
            for status in &filter.statuses {
                values.push(Box::new(status.as_sql().to_string()));
            }
        }
        if let Some(ref assigned_to) = filter.assigned_to_id {
            conditions.push("assigned_to_id = ?".to_string());
            values.push(Box::new(assigned_to.clone()));
        }
        if let Some(due_from) = filter.due_from {
            conditions.push("(due_date IS NULL OR due_date >= ?)".to_string());
            values.push(Box::new(date_to_sql(due_from)));
        }
        if let Some(due_until) = filter.due_until {
            conditions.push("(due_date IS NULL OR due_date <= ?)".to_string());
            values.push(Box::new(date_to_sql(due_until)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks {where_clause}
             ORDER BY due_date IS NULL, due_date ASC, created_at DESC"
        );

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params_refs.as_slice(), task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Tasks the user is assigned to or created, for the calendar views.
    pub fn for_user(conn: &Connection, user_id: &str) -> Result<Vec<Task>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE assigned_to_id = ?1 OR created_by_id = ?1"
        ))?;
        let tasks = stmt
            .query_map(params![user_id], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Open tasks due inside `[today, until]`, soonest first.
    pub fn due_soon(
        conn: &Connection,
        visibility: &TaskVisibility,
        today: NaiveDate,
        until: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Task>> {
        let mut conditions: Vec<String> = vec![
            "due_date IS NOT NULL".to_string(),
            "due_date >= ?".to_string(),
            "due_date <= ?".to_string(),
            "status IN ('pending', 'requested', 'in_progress')".to_string(),
        ];
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![
            Box::new(date_to_sql(today)),
            Box::new(date_to_sql(until)),
        ];
        push_visibility(visibility, &mut conditions, &mut values);
        values.push(Box::new(limit));

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE {} ORDER BY due_date ASC LIMIT ?",
            conditions.join(" AND ")
        );
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params_refs.as_slice(), task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Distinct years with a due date on the user's tasks.
    pub fn due_years_for_user(conn: &Connection, user_id: &str) -> Result<Vec<i32>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT CAST(strftime('%Y', due_date) AS INTEGER) FROM tasks
             WHERE (assigned_to_id = ?1 OR created_by_id = ?1) AND due_date IS NOT NULL
             ORDER BY 1 DESC",
        )?;
        let years = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(years)
    }

    /// Assignment statistics for one assignee, for the archive view.
    pub fn stats_for_assignee(
        conn: &Connection,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<AssigneeStats> {
        let count = |sql: &str| -> Result<i64> {
            Ok(conn.query_row(sql, params![user_id], |row| row.get(0))?)
        };
        let total = count("SELECT COUNT(*) FROM tasks WHERE assigned_to_id = ?1")?;
        let completed = count(
            "SELECT COUNT(*) FROM tasks WHERE assigned_to_id = ?1 AND status = 'completed'",
        )?;
        let in_progress = count(
            "SELECT COUNT(*) FROM tasks WHERE assigned_to_id = ?1 AND status = 'in_progress'",
        )?;
        let pending = count(
            "SELECT COUNT(*) FROM tasks
             WHERE assigned_to_id = ?1 AND status IN ('pending', 'requested')",
        )?;
        let overdue = conn.query_row(
            "SELECT COUNT(*) FROM tasks
             WHERE assigned_to_id = ?1 AND due_date IS NOT NULL AND due_date < ?2
               AND status NOT IN ('completed', 'cancelled')",
            params![user_id, date_to_sql(today)],
            |row| row.get(0),
        )?;
        #[allow(clippy::cast_precision_loss)]
        let completion_rate = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Ok(AssigneeStats {
            total,
            completed,
            in_progress,
            pending,
            overdue,
            completion_rate,
        })
    }

    /// Update a task. Returns the updated task, or `None` if not found.
    #[allow(clippy::too_many_lines)]
    pub fn update(
        conn: &Connection,
        id: &str,
        updates: &TaskUpdateParams,
    ) -> Result<Option<Task>> {
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref title) = updates.title {
            sets.push("title = ?".to_string());
            values.push(Box::new(title.clone()));
        }
        if let Some(ref description) = updates.description {
            sets.push("description = ?".to_string());
            values.push(Box::new(description.clone()));
        }
        if let Some(status) = updates.status {
            sets.push("status = ?".to_string());
            values.push(Box::new(status.as_sql().to_string()));
        }
        if let Some(priority) = updates.priority {
            sets.push("priority = ?".to_string());
            values.push(Box::new(priority.as_sql().to_string()));
        }
        if let Some(ref assigned_to) = updates.assigned_to_id {
            sets.push("assigned_to_id = ?".to_string());
            let normalized = assigned_to.clone().filter(|s| !s.is_empty());
            values.push(Box::new(normalized));
        }
        if let Some(start_date) = updates.start_date {
            sets.push("start_date = ?".to_string());
            values.push(Box::new(start_date.map(date_to_sql)));
        }
        if let Some(due_date) = updates.due_date {
            sets.push("due_date = ?".to_string());
            values.push(Box::new(due_date.map(date_to_sql)));
        }
        if let Some(is_recurring) = updates.is_recurring {
            sets.push("is_recurring = ?".to_string());
            values.push(Box::new(i64::from(is_recurring)));
        }
        if let Some(recurrence) = updates.recurrence {
            sets.push("recurrence = ?".to_string());
            values.push(Box::new(recurrence.as_sql().to_string()));
        }

        if sets.is_empty() {
            return Self::get(conn, id);
        }

        sets.push("updated_at = ?".to_string());
        values.push(Box::new(now_iso()));
        values.push(Box::new(id.to_string()));

        let sql = format!("UPDATE tasks SET {} WHERE id = ?", sets.join(", "));
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let changed = conn.execute(&sql, params_refs.as_slice())?;
        if changed == 0 {
            return Ok(None);
        }
        Self::get(conn, id)
    }

    /// Store a new status, bumping `updated_at`.
    pub fn set_status(conn: &Connection, id: &str, status: TaskStatus) -> Result<()> {
        let _ = conn.execute(
            "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_sql(), now_iso(), id],
        )?;
        Ok(())
    }

    /// Delete a task by ID. Comments cascade. Returns true if a row was
    /// deleted.
    pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Comments
    // ─────────────────────────────────────────────────────────────────────

    /// Append a comment to a task.
    pub fn add_comment(
        conn: &Connection,
        task_id: &str,
        user_id: &str,
        comment: &str,
    ) -> Result<String> {
        let id = generate_id(ids::COMMENT);
        let _ = conn.execute(
            "INSERT INTO task_comments (id, task_id, user_id, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, task_id, user_id, comment, now_iso()],
        )?;
        Ok(id)
    }

    /// List a task's comments oldest first, with author display names.
    pub fn list_comments(conn: &Connection, task_id: &str) -> Result<Vec<CommentView>> {
        let mut stmt = conn.prepare(
            "SELECT c.id, c.task_id, c.user_id, u.first_name, u.last_name, u.username,
                    c.comment, c.created_at
             FROM task_comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.task_id = ?1
             ORDER BY c.created_at ASC, c.id ASC",
        )?;
        let comments = stmt
            .query_map(params![task_id], |row| {
                let first: String = row.get(3)?;
                let last: String = row.get(4)?;
                let username: String = row.get(5)?;
                let full = format!("{} {}", first.trim(), last.trim());
                let user_name = if full.trim().is_empty() {
                    username
                } else {
                    full.trim().to_string()
                };
                Ok(CommentView {
                    id: row.get(0)?,
                    task_id: row.get(1)?,
                    user_id: row.get(2)?,
                    user_name,
                    comment: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
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

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn create_task(conn: &Connection, creator: &str, title: &str) -> Task {
        TaskRepository::create(
            conn,
            &TaskCreateParams {
                title: title.to_string(),
                created_by_id: creator.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn create_defaults_to_pending_normal() {
        let conn = setup_db();
        let creator = insert_user(&conn, "creator");
        let task = create_task(&conn, &creator, "Visit Ankara pharmacies");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Normal);
        assert!(!task.is_recurring);
        assert_eq!(task.recurrence, Recurrence::None);
    }

    #[test]
    fn create_normalizes_empty_assignee() {
        let conn = setup_db();
        let creator = insert_user(&conn, "creator");
        let task = TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "T".to_string(),
                created_by_id: creator,
                assigned_to_id: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(task.assigned_to_id.is_none());
    }

    #[test]
    fn dates_roundtrip_through_sql() {
        let conn = setup_db();
        let creator = insert_user(&conn, "creator");
        let task = TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "Dated".to_string(),
                created_by_id: creator,
                start_date: Some(date("2024-03-01")),
                due_date: Some(date("2024-03-15")),
                ..Default::default()
            },
        )
        .unwrap();
        let fetched = TaskRepository::get(&conn, &task.id).unwrap().unwrap();
        assert_eq!(fetched.start_date, Some(date("2024-03-01")));
        assert_eq!(fetched.due_date, Some(date("2024-03-15")));
    }

    #[test]
    fn list_visibility_self_only() {
        let conn = setup_db();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bob");
        create_task(&conn, &alice, "Alice task");
        create_task(&conn, &bob, "Bob task");

        let visible = TaskRepository::list(
            &conn,
            &TaskVisibility::SelfOnly {
                user_id: alice.clone(),
            },
            &TaskFilter::default(),
        )
        .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Alice task");
    }

    #[test]
    fn list_visibility_department_or_self() {
        let conn = setup_db();
        let manager = insert_user(&conn, "manager");
        let other = insert_user(&conn, "other");
        conn.execute(
            "INSERT INTO departments (id, name, created_at, updated_at)
             VALUES ('dept-1', 'Sales', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        // A department task created by someone else, plus an unrelated one.
        TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "Dept task".to_string(),
                created_by_id: other.clone(),
                department_id: Some("dept-1".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        create_task(&conn, &other, "Unrelated");

        let visible = TaskRepository::list(
            &conn,
            &TaskVisibility::DepartmentOrSelf {
                department_id: Some("dept-1".to_string()),
                user_id: manager,
            },
            &TaskFilter::default(),
        )
        .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Dept task");
    }

    #[test]
    fn list_filters_by_status_and_assignee() {
        let conn = setup_db();
        let creator = insert_user(&conn, "creator");
        let rep = insert_user(&conn, "rep");
        let task = TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "Assigned".to_string(),
                created_by_id: creator.clone(),
                assigned_to_id: Some(rep.clone()),
                ..Default::default()
            },
        )
        .unwrap();
        TaskRepository::set_status(&conn, &task.id, TaskStatus::InProgress).unwrap();
        create_task(&conn, &creator, "Still pending");

        let visible = TaskRepository::list(
            &conn,
            &TaskVisibility::All,
            &TaskFilter {
                statuses: vec![TaskStatus::InProgress],
                assigned_to_id: Some(rep),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, task.id);
    }

    #[test]
    fn list_orders_due_dates_first_then_newest() {
        let conn = setup_db();
        let creator = insert_user(&conn, "creator");
        TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "No due".to_string(),
                created_by_id: creator.clone(),
                ..Default::default()
            },
        )
        .unwrap();
        TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "Later".to_string(),
                created_by_id: creator.clone(),
                due_date: Some(date("2024-04-01")),
                ..Default::default()
            },
        )
        .unwrap();
        TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "Sooner".to_string(),
                created_by_id: creator,
                due_date: Some(date("2024-03-01")),
                ..Default::default()
            },
        )
        .unwrap();

        let tasks =
            TaskRepository::list(&conn, &TaskVisibility::All, &TaskFilter::default()).unwrap();
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Sooner", "Later", "No due"]);
    }

    #[test]
    fn due_soon_window_and_status() {
        let conn = setup_db();
        let creator = insert_user(&conn, "creator");
        TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "Due tomorrow".to_string(),
                created_by_id: creator.clone(),
                due_date: Some(date("2024-03-02")),
                ..Default::default()
            },
        )
        .unwrap();
        let done = TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "Done already".to_string(),
                created_by_id: creator.clone(),
                due_date: Some(date("2024-03-02")),
                ..Default::default()
            },
        )
        .unwrap();
        TaskRepository::set_status(&conn, &done.id, TaskStatus::Completed).unwrap();
        TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "Far future".to_string(),
                created_by_id: creator,
                due_date: Some(date("2024-06-01")),
                ..Default::default()
            },
        )
        .unwrap();

        let due = TaskRepository::due_soon(
            &conn,
            &TaskVisibility::All,
            date("2024-03-01"),
            date("2024-03-04"),
            50,
        )
        .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].title, "Due tomorrow");
    }

    #[test]
    fn update_clears_due_date_with_inner_none() {
        let conn = setup_db();
        let creator = insert_user(&conn, "creator");
        let task = TaskRepository::create(
            &conn,
            &TaskCreateParams {
                title: "T".to_string(),
                created_by_id: creator,
                due_date: Some(date("2024-03-15")),
                ..Default::default()
            },
        )
        .unwrap();

        let updated = TaskRepository::update(
            &conn,
            &task.id,
            &TaskUpdateParams {
                due_date: Some(None),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert!(updated.due_date.is_none());
    }

    #[test]
    fn update_missing_task_returns_none() {
        let conn = setup_db();
        let result = TaskRepository::update(
            &conn,
            "task-missing",
            &TaskUpdateParams {
                title: Some("X".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn comments_join_author_name_oldest_first() {
        let conn = setup_db();
        let creator = insert_user(&conn, "creator");
        let task = create_task(&conn, &creator, "T");
        TaskRepository::add_comment(&conn, &task.id, &creator, "first").unwrap();
        TaskRepository::add_comment(&conn, &task.id, &creator, "second").unwrap();

        let comments = TaskRepository::list_comments(&conn, &task.id).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment, "first");
        assert_eq!(comments[0].user_name, "Test creator");
    }

    #[test]
    fn delete_cascades_comments() {
        let conn = setup_db();
        let creator = insert_user(&conn, "creator");
        let task = create_task(&conn, &creator, "T");
        TaskRepository::add_comment(&conn, &task.id, &creator, "bye").unwrap();

        assert!(TaskRepository::delete(&conn, &task.id).unwrap());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM task_comments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
