//! Planning row types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One editable plan row, unique per (representative, day).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Planning {
    /// Row ID (`plan-` prefix).
    pub id: String,
    /// Owning representative.
    pub representative_id: String,
    /// Calendar day the plan is for.
    pub date: NaiveDate,
    /// What was done yesterday.
    pub yesterday_activities: Option<String>,
    /// What is planned for today.
    pub today_plan: Option<String>,
    /// Challenges encountered.
    pub challenges: Option<String>,
    /// Creation timestamp; the 24-hour edit window counts from here.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// One immutable audit snapshot, appended on every successful write.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanningSnapshot {
    /// Row ID (`snap-` prefix).
    pub id: String,
    /// Owning representative.
    pub representative_id: String,
    /// Calendar day.
    pub date: NaiveDate,
    /// Yesterday field at write time.
    pub yesterday_activities: Option<String>,
    /// Today field at write time.
    pub today_plan: Option<String>,
    /// Challenges field at write time.
    pub challenges: Option<String>,
    /// When the snapshot was taken.
    pub created_at: String,
}

/// The editable fields of a plan.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlanningFields {
    /// What was done yesterday.
    pub yesterday_activities: Option<String>,
    /// What is planned for today.
    pub today_plan: Option<String>,
    /// Challenges encountered.
    pub challenges: Option<String>,
}
