//! Calendar view types and month arithmetic.

use chrono::NaiveDate;
use serde::Serialize;

/// First day of the month and the exclusive first day of the next one.
///
/// Returns `None` for an out-of-range year/month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, end))
}

/// Capped per-day assignment summary shown to privileged callers.
#[derive(Clone, Debug, Serialize)]
pub struct TaskAssignmentSummary {
    /// Assignee display name, `-` when unassigned.
    pub assigned_to_name: String,
    /// Assigner display name (creator as fallback), `-` when unknown.
    pub assigned_by_name: String,
}

/// One day cell of the month view.
#[derive(Clone, Debug, Serialize)]
pub struct MonthDay {
    /// Day of month, 1-based.
    pub day: u32,
    /// A plan or snapshot exists for the day.
    pub has_planning: bool,
    /// At least one task occurs on the day (recurrence included).
    pub has_tasks: bool,
    /// A task was assigned (start or creation) on the day.
    pub has_task_assign: bool,
    /// A task is due on the day.
    pub has_task_due: bool,
    /// First two assignment summaries, for privileged callers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks_meta: Option<Vec<TaskAssignmentSummary>>,
    /// How many further assignments were cut off by the cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks_meta_more: Option<usize>,
}

/// One month folder in the year listing.
#[derive(Clone, Debug, Serialize)]
pub struct MonthFolder {
    /// Year.
    pub year: i32,
    /// Month, 1-based.
    pub month: u32,
    /// Display label, `YYYY-MM`.
    pub label: String,
    /// Days in the month that have a plan row.
    pub days_with_entries: i64,
}

/// One year folder in the archive listing.
#[derive(Clone, Debug, Serialize)]
pub struct YearFolder {
    /// Year.
    pub year: i32,
    /// Display label.
    pub label: String,
    /// Days in the year that have a plan row.
    pub days_with_entries: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn month_bounds_mid_year() {
        let (start, end) = month_bounds(2024, 4).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn month_bounds_december_rolls_year() {
        let (start, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(start.year(), 2024);
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn month_bounds_rejects_bad_month() {
        assert!(month_bounds(2024, 13).is_none());
        assert!(month_bounds(2024, 0).is_none());
    }

    #[test]
    fn leap_february_has_29_days() {
        let (start, end) = month_bounds(2024, 2).unwrap();
        assert_eq!((end - start).num_days(), 29);
    }
}
