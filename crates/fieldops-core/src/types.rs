//! Closed enums for fields the legacy data model stored as free text.
//!
//! Unrecognized values are rejected at parse time rather than treated
//! as falsy, so a typo in a client payload is a 400, not a silent no-op.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// System role of a principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unrestricted access to every module and record.
    Admin,
    /// Manages the users of one department.
    DepartmentManager,
    /// Regular user; sees only their own records.
    User,
}

impl Role {
    /// SQL string representation.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::DepartmentManager => "department_manager",
            Self::User => "user",
        }
    }

    /// Parse from the SQL/API string form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "admin" => Ok(Self::Admin),
            "department_manager" => Ok(Self::DepartmentManager),
            "user" => Ok(Self::User),
            other => Err(CoreError::unknown_value("role", other)),
        }
    }
}

/// Lifecycle status of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created and waiting for the assignee to approve.
    Pending,
    /// Opened by a plain user as a work request awaiting triage.
    Requested,
    /// Approved by the assignee and underway.
    InProgress,
    /// Delivered.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl TaskStatus {
    /// SQL string representation.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Requested => "requested",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from the SQL/API string form (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "requested" => Ok(Self::Requested),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::unknown_value("status", other)),
        }
    }

    /// Whether the status is terminal (no further transitions expected).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the status still counts as open work.
    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }
}

/// Priority of a task. Sort order: high before normal before low.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low urgency.
    Low,
    /// Default.
    Normal,
    /// Needs attention first.
    High,
}

impl TaskPriority {
    /// SQL string representation.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    /// Parse from the SQL/API string form (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(CoreError::unknown_value("priority", other)),
        }
    }

    /// Sort key: 0 for high, 1 for normal, 2 for low.
    pub fn sort_key(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Normal => 1,
            Self::Low => 2,
        }
    }
}

/// Recurrence pattern of a task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// One-shot task.
    #[default]
    None,
    /// Every day within bounds.
    Daily,
    /// Same weekday as the anchor.
    Weekly,
    /// Same day-of-month as the anchor.
    Monthly,
    /// Same month and day as the anchor.
    Yearly,
}

impl Recurrence {
    /// SQL string representation.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Parse from the SQL/API string form (case-insensitive; empty means none).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(CoreError::unknown_value("recurrence", other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
