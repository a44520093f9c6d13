//! Task status transition rules.
//!
//! The workflow is role-gated:
//!
//! - `approve`: only the assignee, from pending/requested, lands on
//!   in-progress.
//! - `deliver`: only the assignee, from pending/requested/in-progress,
//!   lands on completed; refused once the due date has passed on the
//!   organization calendar.
//! - direct status update: admins and the task department's manager may
//!   set anything; a plain assignee/creator may only set in-progress,
//!   completed, or cancelled.

use chrono::NaiveDate;

use fieldops_core::TaskStatus;
use fieldops_users::User;

use crate::errors::AccessError;

/// Validate an approve call. Returns the status to store.
pub fn approve_transition(
    current: TaskStatus,
    assigned_to: Option<&str>,
    actor_id: &str,
) -> Result<TaskStatus, AccessError> {
    if assigned_to != Some(actor_id) {
        return Err(AccessError::Forbidden(
            "only the assignee may approve this task".to_string(),
        ));
    }
    match current {
        TaskStatus::Pending | TaskStatus::Requested => Ok(TaskStatus::InProgress),
        other => Err(AccessError::InvalidTransition(format!(
            "task cannot be approved from status {}",
            other.as_sql()
        ))),
    }
}

/// Validate a deliver call. Returns the status to store.
///
/// `today` is the organization calendar date; a due date strictly
/// before it refuses delivery.
pub fn deliver_transition(
    current: TaskStatus,
    assigned_to: Option<&str>,
    actor_id: &str,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<TaskStatus, AccessError> {
    if assigned_to != Some(actor_id) {
        return Err(AccessError::Forbidden(
            "only the assignee may deliver this task".to_string(),
        ));
    }
    match current {
        TaskStatus::Pending | TaskStatus::Requested | TaskStatus::InProgress => {}
        other => {
            return Err(AccessError::InvalidTransition(format!(
                "task cannot be delivered from status {}",
                other.as_sql()
            )));
        }
    }
    if let Some(due) = due_date {
        if due < today {
            return Err(AccessError::InvalidTransition(
                "task is overdue and can no longer be delivered".to_string(),
            ));
        }
    }
    Ok(TaskStatus::Completed)
}

/// Validate a direct status update through the task PUT surface.
///
/// Admins and the manager of the task's department may set any status.
/// A plain user must be the assignee or creator and may only move the
/// task to in-progress, completed, or cancelled.
pub fn direct_status_allowed(
    actor: &User,
    task_department_id: Option<&str>,
    assigned_to: Option<&str>,
    created_by: &str,
    requested: TaskStatus,
) -> Result<(), AccessError> {
    if actor.is_admin() {
        return Ok(());
    }
    if let Some(department_id) = task_department_id {
        if actor.manages_department(department_id) {
            return Ok(());
        }
    }
    if assigned_to != Some(actor.id.as_str()) && created_by != actor.id {
        return Err(AccessError::Forbidden(
            "not allowed to update this task".to_string(),
        ));
    }
    match requested {
        TaskStatus::InProgress | TaskStatus::Completed | TaskStatus::Cancelled => Ok(()),
        other => Err(AccessError::InvalidTransition(format!(
            "status {} cannot be set directly",
            other.as_sql()
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
