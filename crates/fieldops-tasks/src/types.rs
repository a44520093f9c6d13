//! Task row types and parameter structs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fieldops_core::{Recurrence, TaskPriority, TaskStatus};

/// One task row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Row ID (`task-` prefix).
    pub id: String,
    /// Title.
    pub title: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Department the task belongs to (usually the creator's).
    pub department_id: Option<String>,
    /// Who assigned it.
    pub assigned_by_id: Option<String>,
    /// Who it is assigned to.
    pub assigned_to_id: Option<String>,
    /// Who created it.
    pub created_by_id: String,
    /// Workflow status.
    pub status: TaskStatus,
    /// Priority.
    pub priority: TaskPriority,
    /// Optional start date.
    pub start_date: Option<NaiveDate>,
    /// Optional due date; also the recurrence upper bound.
    pub due_date: Option<NaiveDate>,
    /// Whether the recurrence field is honored at all.
    pub is_recurring: bool,
    /// Recurrence pattern; treated as none unless `is_recurring`.
    pub recurrence: Recurrence,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// A comment joined with its author's display name.
#[derive(Clone, Debug, Serialize)]
pub struct CommentView {
    /// Row ID (`comment-` prefix).
    pub id: String,
    /// Parent task.
    pub task_id: String,
    /// Author.
    pub user_id: String,
    /// Author display name at read time.
    pub user_name: String,
    /// Comment text.
    pub comment: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Parameters for creating one task row.
#[derive(Clone, Debug, Default)]
pub struct TaskCreateParams {
    /// Title (required).
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Owning department.
    pub department_id: Option<String>,
    /// Assigner.
    pub assigned_by_id: Option<String>,
    /// Assignee.
    pub assigned_to_id: Option<String>,
    /// Creator (required).
    pub created_by_id: String,
    /// Initial status; `None` defaults to pending.
    pub status: Option<TaskStatus>,
    /// Priority; `None` defaults to normal.
    pub priority: Option<TaskPriority>,
    /// Start date.
    pub start_date: Option<NaiveDate>,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Recurrence flag.
    pub is_recurring: bool,
    /// Recurrence pattern.
    pub recurrence: Option<Recurrence>,
}

/// Partial update for a task. `None` leaves the field untouched; the
/// inner `Option` of double-option fields distinguishes "set to null".
#[derive(Clone, Debug, Default)]
pub struct TaskUpdateParams {
    /// New title.
    pub title: Option<String>,
    /// New description (inner `None` clears).
    pub description: Option<Option<String>>,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New priority.
    pub priority: Option<TaskPriority>,
    /// New assignee (inner `None` clears).
    pub assigned_to_id: Option<Option<String>>,
    /// New start date (inner `None` clears).
    pub start_date: Option<Option<NaiveDate>>,
    /// New due date (inner `None` clears).
    pub due_date: Option<Option<NaiveDate>>,
    /// New recurrence flag.
    pub is_recurring: Option<bool>,
    /// New recurrence pattern.
    pub recurrence: Option<Recurrence>,
}

/// Row-visibility rule applied to task listings.
#[derive(Clone, Debug)]
pub enum TaskVisibility {
    /// Admin: every task.
    All,
    /// Department manager: the department's tasks plus anything they
    /// created or were assigned.
    DepartmentOrSelf {
        /// The manager's department, when they have one.
        department_id: Option<String>,
        /// The manager's own user ID.
        user_id: String,
    },
    /// Plain user: tasks they created or were assigned.
    SelfOnly {
        /// The user's ID.
        user_id: String,
    },
}

impl TaskVisibility {
    /// Visibility for a principal, mirroring scope resolution.
    pub fn for_user(user: &fieldops_users::User) -> Self {
        if user.is_admin() {
            Self::All
        } else if user.is_department_manager() {
            Self::DepartmentOrSelf {
                department_id: user.department_id.clone(),
                user_id: user.id.clone(),
            }
        } else {
            Self::SelfOnly {
                user_id: user.id.clone(),
            }
        }
    }
}

/// Filters for task listings, combined with a visibility rule.
#[derive(Clone, Debug, Default)]
pub struct TaskFilter {
    /// Restrict to these statuses (empty = all).
    pub statuses: Vec<TaskStatus>,
    /// Restrict to one assignee.
    pub assigned_to_id: Option<String>,
    /// Keep tasks with no due date or a due date on/after this.
    pub due_from: Option<NaiveDate>,
    /// Keep tasks with no due date or a due date on/before this.
    pub due_until: Option<NaiveDate>,
}
