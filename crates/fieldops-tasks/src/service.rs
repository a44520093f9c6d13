//! Business logic for task management.
//!
//! Wraps the repository with authorization and the workflow rules:
//!
//! - Creation fans out one task per assignee and stamps the creator's
//!   department.
//! - Reads and writes are gated by scope; assignment targets must be in
//!   the actor's scope.
//! - `approve`/`deliver` and direct status updates go through the
//!   transition rules in `fieldops-access`.

use rusqlite::Connection;
use tracing::info;

use fieldops_core::{OrgClock, TaskPriority};
use fieldops_access::{approve_transition, deliver_transition, direct_status_allowed, is_in_scope};
use fieldops_users::{User, UserRepository};

use crate::errors::{Result, TaskError};
use crate::recurrence::occurs_on;
use crate::repository::TaskRepository;
use crate::types::{CommentView, Task, TaskCreateParams, TaskUpdateParams};

/// Service-level create request; fans out to one task per assignee.
#[derive(Clone, Debug, Default)]
pub struct TaskCreateRequest {
    /// Title (required).
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Assignees; empty creates a single unassigned task.
    pub assigned_to_ids: Vec<String>,
    /// Priority; defaults to normal.
    pub priority: Option<TaskPriority>,
    /// Start date.
    pub start_date: Option<chrono::NaiveDate>,
    /// Due date.
    pub due_date: Option<chrono::NaiveDate>,
    /// Recurrence flag.
    pub is_recurring: bool,
    /// Recurrence pattern.
    pub recurrence: Option<fieldops_core::Recurrence>,
}

/// Task service with business logic and authorization.
pub struct TaskService;

impl TaskService {
    /// Create one task per assignee (or a single unassigned task), all
    /// in one transaction. The tasks inherit the actor's department and
    /// start pending.
    pub fn create(
        conn: &Connection,
        actor: &User,
        request: &TaskCreateRequest,
    ) -> Result<Vec<Task>> {
        if request.title.trim().is_empty() {
            return Err(TaskError::Validation("title is required".to_string()));
        }

        let mut assignees: Vec<Option<String>> = request
            .assigned_to_ids
            .iter()
            .filter(|id| !id.is_empty())
            .cloned()
            .map(Some)
            .collect();
        if assignees.is_empty() {
            assignees.push(None);
        }

        let tx = conn.unchecked_transaction()?;
        let mut created = Vec::with_capacity(assignees.len());
        for assignee in assignees {
            if let Some(ref assignee_id) = assignee {
                if UserRepository::get(&tx, assignee_id)?.is_none() {
                    return Err(TaskError::AssigneeNotFound(assignee_id.clone()));
                }
            }
            let task = TaskRepository::create(
                &tx,
                &TaskCreateParams {
                    title: request.title.clone(),
                    description: request.description.clone(),
                    department_id: actor.department_id.clone(),
                    assigned_by_id: Some(actor.id.clone()),
                    assigned_to_id: assignee,
                    created_by_id: actor.id.clone(),
                    priority: request.priority,
                    start_date: request.start_date,
                    due_date: request.due_date,
                    is_recurring: request.is_recurring,
                    recurrence: request.recurrence,
                    ..Default::default()
                },
            )?;
            created.push(task);
        }
        tx.commit()?;
        info!(count = created.len(), actor = %actor.id, "tasks created");
        Ok(created)
    }

    /// Get a task the actor may see.
    pub fn get(conn: &Connection, actor: &User, id: &str) -> Result<Task> {
        let task = TaskRepository::get(conn, id)?.ok_or_else(|| TaskError::not_found(id))?;
        Self::ensure_access(conn, actor, &task)?;
        Ok(task)
    }

    /// Update a task.
    ///
    /// Admins and the task department's manager may change any field
    /// (assignment targets must be in scope). A plain assignee/creator
    /// may only move the status, within the allowed set; other fields in
    /// the request are ignored for them.
    pub fn update(
        conn: &Connection,
        actor: &User,
        id: &str,
        updates: &TaskUpdateParams,
    ) -> Result<Task> {
        let task = TaskRepository::get(conn, id)?.ok_or_else(|| TaskError::not_found(id))?;
        Self::ensure_access(conn, actor, &task)?;

        let privileged = actor.is_admin()
            || task
                .department_id
                .as_deref()
                .is_some_and(|dept| actor.manages_department(dept));

        let effective = if privileged {
            if let Some(Some(ref new_assignee)) = updates.assigned_to_id {
                if !new_assignee.is_empty() {
                    if UserRepository::get(conn, new_assignee)?.is_none() {
                        return Err(TaskError::AssigneeNotFound(new_assignee.clone()));
                    }
                    if !is_in_scope(conn, actor, new_assignee)? {
                        return Err(TaskError::Access(
                            fieldops_access::AccessError::Forbidden(
                                "assignee is outside your scope".to_string(),
                            ),
                        ));
                    }
                }
            }
            if let Some(status) = updates.status {
                direct_status_allowed(
                    actor,
                    task.department_id.as_deref(),
                    task.assigned_to_id.as_deref(),
                    &task.created_by_id,
                    status,
                )?;
            }
            updates.clone()
        } else {
            if task.assigned_to_id.as_deref() != Some(actor.id.as_str())
                && task.created_by_id != actor.id
            {
                return Err(TaskError::Access(fieldops_access::AccessError::Forbidden(
                    "not allowed to update this task".to_string(),
                )));
            }
            let Some(status) = updates.status else {
                return Err(TaskError::Validation(
                    "no permitted fields in update".to_string(),
                ));
            };
            direct_status_allowed(
                actor,
                task.department_id.as_deref(),
                task.assigned_to_id.as_deref(),
                &task.created_by_id,
                status,
            )?;
            TaskUpdateParams {
                status: Some(status),
                ..Default::default()
            }
        };

        TaskRepository::update(conn, id, &effective)?.ok_or_else(|| TaskError::not_found(id))
    }

    /// Assignee approval: pending/requested becomes in-progress.
    pub fn approve(conn: &Connection, actor: &User, id: &str) -> Result<Task> {
        let task = TaskRepository::get(conn, id)?.ok_or_else(|| TaskError::not_found(id))?;
        let next = approve_transition(task.status, task.assigned_to_id.as_deref(), &actor.id)?;
        TaskRepository::set_status(conn, id, next)?;
        info!(task_id = id, actor = %actor.id, "task approved");
        TaskRepository::get(conn, id)?.ok_or_else(|| TaskError::not_found(id))
    }

    /// Assignee delivery: open statuses become completed, unless the
    /// due date has passed on the organization calendar.
    pub fn deliver(
        conn: &Connection,
        actor: &User,
        clock: &OrgClock,
        id: &str,
    ) -> Result<Task> {
        let task = TaskRepository::get(conn, id)?.ok_or_else(|| TaskError::not_found(id))?;
        let next = deliver_transition(
            task.status,
            task.assigned_to_id.as_deref(),
            &actor.id,
            task.due_date,
            clock.today(),
        )?;
        TaskRepository::set_status(conn, id, next)?;
        info!(task_id = id, actor = %actor.id, "task delivered");
        TaskRepository::get(conn, id)?.ok_or_else(|| TaskError::not_found(id))
    }

    /// Delete a task. Admins delete anything; a department manager may
    /// delete tasks tied to their department through the task itself,
    /// its assignee, or its creator.
    pub fn delete(conn: &Connection, actor: &User, id: &str) -> Result<()> {
        let task = TaskRepository::get(conn, id)?.ok_or_else(|| TaskError::not_found(id))?;

        if !actor.is_admin() {
            if !actor.is_department_manager() {
                return Err(TaskError::Access(fieldops_access::AccessError::Forbidden(
                    "not allowed to delete tasks".to_string(),
                )));
            }
            let own_dept = actor.department_id.as_deref();
            let assignee_dept = match task.assigned_to_id.as_deref() {
                Some(assignee_id) => {
                    UserRepository::get(conn, assignee_id)?.and_then(|u| u.department_id)
                }
                None => None,
            };
            let creator_dept =
                UserRepository::get(conn, &task.created_by_id)?.and_then(|u| u.department_id);

            let related = own_dept.is_some()
                && (task.department_id.as_deref() == own_dept
                    || assignee_dept.as_deref() == own_dept
                    || creator_dept.as_deref() == own_dept);
            if !related {
                return Err(TaskError::Access(fieldops_access::AccessError::Forbidden(
                    "not allowed to delete this task".to_string(),
                )));
            }
        }

        let _ = TaskRepository::delete(conn, id)?;
        info!(task_id = id, actor = %actor.id, "task deleted");
        Ok(())
    }

    /// Add a comment to a task the actor may see.
    pub fn comment(conn: &Connection, actor: &User, id: &str, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(TaskError::Validation("comment is required".to_string()));
        }
        let task = TaskRepository::get(conn, id)?.ok_or_else(|| TaskError::not_found(id))?;
        Self::ensure_access(conn, actor, &task)?;
        TaskRepository::add_comment(conn, id, &actor.id, text)
    }

    /// List a task's comments, gated like reads.
    pub fn comments(conn: &Connection, actor: &User, id: &str) -> Result<Vec<CommentView>> {
        let task = TaskRepository::get(conn, id)?.ok_or_else(|| TaskError::not_found(id))?;
        Self::ensure_access(conn, actor, &task)?;
        TaskRepository::list_comments(conn, id)
    }

    /// Tasks occurring for a user on a given day, highest priority
    /// first, then earliest due date.
    pub fn tasks_on_day(
        conn: &Connection,
        user_id: &str,
        day: chrono::NaiveDate,
    ) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = TaskRepository::for_user(conn, user_id)?
            .into_iter()
            .filter(|t| occurs_on(t, day))
            .collect();
        tasks.sort_by_key(|t| {
            (
                t.priority.sort_key(),
                t.due_date.unwrap_or(chrono::NaiveDate::MAX),
            )
        });
        Ok(tasks)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────

    /// Reads require the assignee (or, for unassigned tasks, the actor
    /// themselves) or the creator to be inside the actor's scope.
    fn ensure_access(conn: &Connection, actor: &User, task: &Task) -> Result<()> {
        if actor.is_admin() {
            return Ok(());
        }
        let assignee_or_self = task.assigned_to_id.as_deref().unwrap_or(actor.id.as_str());
        if is_in_scope(conn, actor, assignee_or_self)?
            || is_in_scope(conn, actor, &task.created_by_id)?
        {
            return Ok(());
        }
        Err(TaskError::Access(fieldops_access::AccessError::Forbidden(
            "no access to this task".to_string(),
        )))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
