//! Business logic for planning.
//!
//! - Saving today's plan upserts the single row for (representative,
//!   today) and appends a snapshot, in one transaction. Edits are only
//!   accepted within 24 hours of the row's creation; the snapshot is
//!   appended on every accepted write.
//! - The calendar views combine plan days with task occurrences from
//!   the recurrence evaluator.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use tracing::info;

use fieldops_core::clock::parse_timestamp;
use fieldops_core::OrgClock;
use fieldops_tasks::{occurs_on, Task, TaskRepository, TaskService};
use fieldops_users::UserRepository;

use crate::calendar::{month_bounds, MonthDay, MonthFolder, TaskAssignmentSummary, YearFolder};
use crate::errors::{PlanningError, Result};
use crate::repository::PlanningRepository;
use crate::types::{Planning, PlanningFields, PlanningSnapshot};

/// How many per-day assignment summaries the month view returns.
const TASKS_META_CAP: usize = 2;

/// A day's plan with its snapshot history.
#[derive(Clone, Debug)]
pub struct DayPlan {
    /// The editable plan row, if one exists.
    pub plan: Option<Planning>,
    /// Every snapshot taken for the day, oldest first.
    pub snapshots: Vec<PlanningSnapshot>,
}

/// A full day detail: plan, snapshots, and the tasks occurring that day.
#[derive(Clone, Debug)]
pub struct DayDetail {
    /// The day.
    pub date: NaiveDate,
    /// The editable plan row, if one exists.
    pub plan: Option<Planning>,
    /// Snapshot history, oldest first.
    pub snapshots: Vec<PlanningSnapshot>,
    /// Tasks occurring on the day, highest priority first.
    pub tasks: Vec<Task>,
}

/// Planning service with business logic.
pub struct PlanningService;

impl PlanningService {
    /// Today's plan and snapshot history for a representative.
    pub fn today_view(
        conn: &Connection,
        clock: &OrgClock,
        representative_id: &str,
    ) -> Result<DayPlan> {
        let today = clock.today();
        Ok(DayPlan {
            plan: PlanningRepository::get_for_day(conn, representative_id, today)?,
            snapshots: PlanningRepository::snapshots_for_day(conn, representative_id, today)?,
        })
    }

    /// Upsert today's plan and append a snapshot, in one transaction.
    ///
    /// A row older than 24 hours can no longer be edited.
    pub fn save_today(
        conn: &Connection,
        clock: &OrgClock,
        representative_id: &str,
        fields: &PlanningFields,
    ) -> Result<Planning> {
        let today = clock.today();
        let now_iso = clock.now_iso();

        let tx = conn.unchecked_transaction()?;
        let plan = match PlanningRepository::get_for_day(&tx, representative_id, today)? {
            None => PlanningRepository::insert(&tx, representative_id, today, fields, &now_iso)?,
            Some(existing) => {
                let created = parse_timestamp(&existing.created_at)?;
                let age = clock.now_utc().signed_duration_since(created);
                if age >= chrono::Duration::hours(24) {
                    return Err(PlanningError::EditWindowClosed);
                }
                PlanningRepository::update_fields(&tx, &existing.id, fields, &now_iso)?;
                PlanningRepository::get_for_day(&tx, representative_id, today)?.ok_or_else(
                    || PlanningError::Validation("plan row vanished mid-update".to_string()),
                )?
            }
        };
        PlanningRepository::append_snapshot(&tx, representative_id, today, fields, &now_iso)?;
        tx.commit()?;

        info!(representative_id, date = %today, "plan saved");
        Ok(plan)
    }

    /// Plan, snapshots, and occurring tasks for an arbitrary day.
    pub fn day_detail(
        conn: &Connection,
        representative_id: &str,
        day: NaiveDate,
    ) -> Result<DayDetail> {
        Ok(DayDetail {
            date: day,
            plan: PlanningRepository::get_for_day(conn, representative_id, day)?,
            snapshots: PlanningRepository::snapshots_for_day(conn, representative_id, day)?,
            tasks: TaskService::tasks_on_day(conn, representative_id, day)?,
        })
    }

    /// Remove a day's plan and snapshots. Returns rows deleted.
    pub fn delete_day(
        conn: &Connection,
        representative_id: &str,
        day: NaiveDate,
    ) -> Result<usize> {
        let deleted = PlanningRepository::delete_day(conn, representative_id, day)?;
        info!(representative_id, date = %day, deleted, "plan day deleted");
        Ok(deleted)
    }

    /// The month calendar: per-day plan/task flags, with capped
    /// assignment summaries for privileged callers.
    #[allow(clippy::too_many_lines)]
    pub fn month_view(
        conn: &Connection,
        representative_id: &str,
        year: i32,
        month: u32,
        privileged: bool,
    ) -> Result<Vec<MonthDay>> {
        let (start, end) = month_bounds(year, month)
            .ok_or_else(|| PlanningError::Validation(format!("invalid month: {year}-{month}")))?;
        let days_in_month = (end - start).num_days();

        let plan_days: std::collections::HashSet<NaiveDate> =
            PlanningRepository::days_with_entries(conn, representative_id, start, end)?
                .into_iter()
                .collect();

        let tasks = TaskRepository::for_user(conn, representative_id)?;

        // Assignment and due markers, independent of recurrence.
        let mut assign_days: std::collections::HashSet<NaiveDate> =
            std::collections::HashSet::new();
        let mut due_days: std::collections::HashSet<NaiveDate> = std::collections::HashSet::new();
        for task in &tasks {
            let assign_day = task.start_date.or_else(|| {
                parse_timestamp(&task.created_at).ok().map(|ts| ts.date_naive())
            });
            if let Some(day) = assign_day {
                if day >= start && day < end {
                    let _ = assign_days.insert(day);
                }
            }
            if let Some(due) = task.due_date {
                if due >= start && due < end {
                    let _ = due_days.insert(due);
                }
            }
        }

        let mut name_cache: HashMap<String, String> = HashMap::new();
        let mut days = Vec::with_capacity(usize::try_from(days_in_month).unwrap_or(31));

        for offset in 0..days_in_month {
            let date = start + chrono::Duration::days(offset);
            let mut occurring: Vec<&Task> = Vec::new();
            for task in &tasks {
                if occurs_on(task, date) {
                    occurring.push(task);
                }
            }

            let (tasks_meta, tasks_meta_more) = if privileged && !occurring.is_empty() {
                let mut meta = Vec::new();
                for task in occurring.iter().take(TASKS_META_CAP) {
                    let assigned_to_name = match task.assigned_to_id.as_deref() {
                        Some(id) => Self::display_name(conn, &mut name_cache, id)?,
                        None => "-".to_string(),
                    };
                    let assigner = task
                        .assigned_by_id
                        .as_deref()
                        .unwrap_or(task.created_by_id.as_str());
                    let assigned_by_name = Self::display_name(conn, &mut name_cache, assigner)?;
                    meta.push(TaskAssignmentSummary {
                        assigned_to_name,
                        assigned_by_name,
                    });
                }
                let more = occurring.len().saturating_sub(TASKS_META_CAP);
                (Some(meta), if more > 0 { Some(more) } else { None })
            } else {
                (None, None)
            };

            days.push(MonthDay {
                day: date.day(),
                has_planning: plan_days.contains(&date),
                has_tasks: !occurring.is_empty(),
                has_task_assign: assign_days.contains(&date),
                has_task_due: due_days.contains(&date),
                tasks_meta,
                tasks_meta_more,
            });
        }
        Ok(days)
    }

    /// Twelve month folders for a year, with plan-day counts.
    pub fn months(
        conn: &Connection,
        representative_id: &str,
        year: i32,
    ) -> Result<Vec<MonthFolder>> {
        let mut months = Vec::with_capacity(12);
        for month in 1..=12 {
            let (start, end) = month_bounds(year, month)
                .ok_or_else(|| PlanningError::Validation(format!("invalid year: {year}")))?;
            let days_with_entries =
                PlanningRepository::count_days_in_range(conn, representative_id, start, end)?;
            months.push(MonthFolder {
                year,
                month,
                label: format!("{year}-{month:02}"),
                days_with_entries,
            });
        }
        Ok(months)
    }

    /// Year folders: every year with a plan or a task due date, plus the
    /// current one, newest first.
    pub fn years(
        conn: &Connection,
        clock: &OrgClock,
        representative_id: &str,
    ) -> Result<Vec<YearFolder>> {
        let mut years: std::collections::BTreeSet<i32> =
            PlanningRepository::years_with_plans(conn, representative_id)?
                .into_iter()
                .collect();
        for year in TaskRepository::due_years_for_user(conn, representative_id)? {
            let _ = years.insert(year);
        }
        let _ = years.insert(clock.today().year());

        let mut folders = Vec::with_capacity(years.len());
        for year in years.into_iter().rev() {
            let start = NaiveDate::from_ymd_opt(year, 1, 1)
                .ok_or_else(|| PlanningError::Validation(format!("invalid year: {year}")))?;
            let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
                .ok_or_else(|| PlanningError::Validation(format!("invalid year: {year}")))?;
            let days_with_entries =
                PlanningRepository::count_days_in_range(conn, representative_id, start, end)?;
            folders.push(YearFolder {
                year,
                label: year.to_string(),
                days_with_entries,
            });
        }
        Ok(folders)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────

    fn display_name(
        conn: &Connection,
        cache: &mut HashMap<String, String>,
        user_id: &str,
    ) -> Result<String> {
        if let Some(name) = cache.get(user_id) {
            return Ok(name.clone());
        }
        let name = UserRepository::get(conn, user_id)?
            .map_or_else(|| "-".to_string(), |user| user.full_name());
        let _ = cache.insert(user_id.to_string(), name.clone());
        Ok(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
