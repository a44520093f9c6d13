//! Recurrence evaluation.
//!
//! `occurs_on` is pure and O(1) per call; month views call it up to
//! `days_in_month x task_count` times.
//!
//! Anchor resolution for recurring tasks: start date, else due date,
//! else the calendar date of creation. The due date, when present, is
//! also the upper bound of the recurrence window.
//!
//! Monthly recurrence matches on the anchor's day-of-month with no
//! adjustment for shorter months: a task anchored on the 31st does not
//! occur at all in a 30-day month.

use chrono::{Datelike, NaiveDate};

use fieldops_core::clock::parse_timestamp;
use fieldops_core::Recurrence;

use crate::types::Task;

/// Whether the task occurs on the given calendar day.
pub fn occurs_on(task: &Task, day: NaiveDate) -> bool {
    let recurrence = if task.is_recurring {
        task.recurrence
    } else {
        Recurrence::None
    };

    if recurrence == Recurrence::None {
        return task.start_date == Some(day) || task.due_date == Some(day);
    }

    let anchor = task
        .start_date
        .or(task.due_date)
        .or_else(|| parse_timestamp(&task.created_at).ok().map(|ts| ts.date_naive()));
    let Some(anchor) = anchor else {
        return false;
    };

    if day < anchor {
        return false;
    }
    if let Some(due) = task.due_date {
        if day > due {
            return false;
        }
    }

    match recurrence {
        Recurrence::None => false,
        Recurrence::Daily => true,
        Recurrence::Weekly => day.weekday() == anchor.weekday(),
        Recurrence::Monthly => day.day() == anchor.day(),
        Recurrence::Yearly => day.month() == anchor.month() && day.day() == anchor.day(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
