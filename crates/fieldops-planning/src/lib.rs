//! # fieldops-planning
//!
//! Daily planning logs: one editable row per representative and day
//! (24-hour edit window), an immutable snapshot appended on every
//! write, and the calendar views that combine plans with task
//! occurrences.

#![deny(unsafe_code)]

pub mod calendar;
pub mod errors;
pub mod repository;
pub mod service;
pub mod types;

pub use calendar::{month_bounds, MonthDay, MonthFolder, TaskAssignmentSummary, YearFolder};
pub use errors::PlanningError;
pub use repository::PlanningRepository;
pub use service::{DayDetail, DayPlan, PlanningService};
pub use types::{Planning, PlanningFields, PlanningSnapshot};
