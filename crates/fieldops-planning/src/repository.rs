//! SQL data access for plans and snapshots.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use fieldops_core::clock::{DATE_FORMAT, TIMESTAMP_FORMAT};
use fieldops_core::{generate_id, ids};

use crate::errors::Result;
use crate::types::{Planning, PlanningFields, PlanningSnapshot};

fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_from_sql(idx: usize, value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn planning_from_row(row: &Row<'_>) -> rusqlite::Result<Planning> {
    Ok(Planning {
        id: row.get(0)?,
        representative_id: row.get(1)?,
        date: date_from_sql(2, row.get(2)?)?,
        yesterday_activities: row.get(3)?,
        today_plan: row.get(4)?,
        challenges: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<PlanningSnapshot> {
    Ok(PlanningSnapshot {
        id: row.get(0)?,
        representative_id: row.get(1)?,
        date: date_from_sql(2, row.get(2)?)?,
        yesterday_activities: row.get(3)?,
        today_plan: row.get(4)?,
        challenges: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const PLANNING_COLUMNS: &str = "id, representative_id, date, yesterday_activities, today_plan, \
     challenges, created_at, updated_at";
const SNAPSHOT_COLUMNS: &str =
    "id, representative_id, date, yesterday_activities, today_plan, challenges, created_at";

/// Planning repository for SQL CRUD operations.
pub struct PlanningRepository;

impl PlanningRepository {
    /// The plan for a representative and day, if any.
    pub fn get_for_day(
        conn: &Connection,
        representative_id: &str,
        day: NaiveDate,
    ) -> Result<Option<Planning>> {
        let plan = conn
            .query_row(
                &format!(
                    "SELECT {PLANNING_COLUMNS} FROM planning
                     WHERE representative_id = ?1 AND date = ?2"
                ),
                params![representative_id, date_to_sql(day)],
                planning_from_row,
            )
            .optional()?;
        Ok(plan)
    }

    /// Insert a fresh plan row. `now_iso` stamps both timestamps.
    pub fn insert(
        conn: &Connection,
        representative_id: &str,
        day: NaiveDate,
        fields: &PlanningFields,
        now_iso: &str,
    ) -> Result<Planning> {
        let id = generate_id(ids::PLANNING);
        let _ = conn.execute(
            "INSERT INTO planning (id, representative_id, date, yesterday_activities,
             today_plan, challenges, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                id,
                representative_id,
                date_to_sql(day),
                fields.yesterday_activities,
                fields.today_plan,
                fields.challenges,
                now_iso,
            ],
        )?;
        Self::get_for_day(conn, representative_id, day)?
            .ok_or_else(|| crate::PlanningError::Validation("plan insert vanished".to_string()))
    }

    /// Overwrite the editable fields of an existing plan row.
    pub fn update_fields(
        conn: &Connection,
        id: &str,
        fields: &PlanningFields,
        now_iso: &str,
    ) -> Result<()> {
        let _ = conn.execute(
            "UPDATE planning SET yesterday_activities = ?1, today_plan = ?2, challenges = ?3,
             updated_at = ?4 WHERE id = ?5",
            params![
                fields.yesterday_activities,
                fields.today_plan,
                fields.challenges,
                now_iso,
                id,
            ],
        )?;
        Ok(())
    }

    /// Append one immutable snapshot row.
    pub fn append_snapshot(
        conn: &Connection,
        representative_id: &str,
        day: NaiveDate,
        fields: &PlanningFields,
        now_iso: &str,
    ) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO planning_snapshots (id, representative_id, date, yesterday_activities,
             today_plan, challenges, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                generate_id(ids::SNAPSHOT),
                representative_id,
                date_to_sql(day),
                fields.yesterday_activities,
                fields.today_plan,
                fields.challenges,
                now_iso,
            ],
        )?;
        Ok(())
    }

    /// Snapshots for a representative and day, oldest first.
    pub fn snapshots_for_day(
        conn: &Connection,
        representative_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<PlanningSnapshot>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM planning_snapshots
             WHERE representative_id = ?1 AND date = ?2
             ORDER BY created_at ASC, id ASC"
        ))?;
        let snapshots = stmt
            .query_map(params![representative_id, date_to_sql(day)], snapshot_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(snapshots)
    }

    /// Count plan rows in `[start, end)`.
    pub fn count_days_in_range(
        conn: &Connection,
        representative_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM planning
             WHERE representative_id = ?1 AND date >= ?2 AND date < ?3",
            params![representative_id, date_to_sql(start), date_to_sql(end)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Distinct days in `[start, end)` with a plan row or a snapshot.
    pub fn days_with_entries(
        conn: &Connection,
        representative_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT date FROM (
               SELECT date FROM planning
                 WHERE representative_id = ?1 AND date >= ?2 AND date < ?3
               UNION
               SELECT date FROM planning_snapshots
                 WHERE representative_id = ?1 AND date >= ?2 AND date < ?3
             ) ORDER BY date ASC",
        )?;
        let days = stmt
            .query_map(
                params![representative_id, date_to_sql(start), date_to_sql(end)],
                |row| date_from_sql(0, row.get(0)?),
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(days)
    }

    /// Distinct years that have plan rows for the representative.
    pub fn years_with_plans(conn: &Connection, representative_id: &str) -> Result<Vec<i32>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT CAST(strftime('%Y', date) AS INTEGER) FROM planning
             WHERE representative_id = ?1 ORDER BY 1 DESC",
        )?;
        let years = stmt
            .query_map(params![representative_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(years)
    }

    /// Delete the plan and every snapshot for a day. Returns how many
    /// rows went away.
    pub fn delete_day(
        conn: &Connection,
        representative_id: &str,
        day: NaiveDate,
    ) -> Result<usize> {
        let plans = conn.execute(
            "DELETE FROM planning WHERE representative_id = ?1 AND date = ?2",
            params![representative_id, date_to_sql(day)],
        )?;
        let snapshots = conn.execute(
            "DELETE FROM planning_snapshots WHERE representative_id = ?1 AND date = ?2",
            params![representative_id, date_to_sql(day)],
        )?;
        Ok(plans + snapshots)
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

    fn fields(today_plan: &str) -> PlanningFields {
        PlanningFields {
            today_plan: Some(today_plan.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let conn = setup_db();
        let rep = insert_user(&conn, "rep");
        let plan = PlanningRepository::insert(
            &conn,
            &rep,
            date("2024-03-01"),
            &fields("visit two pharmacies"),
            "2024-03-01T06:00:00Z",
        )
        .unwrap();
        assert_eq!(plan.date, date("2024-03-01"));
        assert_eq!(plan.today_plan.as_deref(), Some("visit two pharmacies"));
    }

    #[test]
    fn second_insert_same_day_violates_unique() {
        let conn = setup_db();
        let rep = insert_user(&conn, "rep");
        PlanningRepository::insert(&conn, &rep, date("2024-03-01"), &fields("a"), "2024-03-01T06:00:00Z").unwrap();
        let duplicate = PlanningRepository::insert(
            &conn,
            &rep,
            date("2024-03-01"),
            &fields("b"),
            "2024-03-01T07:00:00Z",
        );
        assert!(duplicate.is_err());
    }

    #[test]
    fn snapshots_accumulate_in_order() {
        let conn = setup_db();
        let rep = insert_user(&conn, "rep");
        let day = date("2024-03-01");
        PlanningRepository::append_snapshot(&conn, &rep, day, &fields("v1"), "2024-03-01T06:00:00Z").unwrap();
        PlanningRepository::append_snapshot(&conn, &rep, day, &fields("v2"), "2024-03-01T08:00:00Z").unwrap();

        let snapshots = PlanningRepository::snapshots_for_day(&conn, &rep, day).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].today_plan.as_deref(), Some("v1"));
        assert_eq!(snapshots[1].today_plan.as_deref(), Some("v2"));
    }

    #[test]
    fn days_with_entries_unions_plans_and_snapshots() {
        let conn = setup_db();
        let rep = insert_user(&conn, "rep");
        PlanningRepository::insert(&conn, &rep, date("2024-03-01"), &fields("a"), "2024-03-01T06:00:00Z").unwrap();
        // Snapshot-only day (plan later deleted, snapshot retained).
        PlanningRepository::append_snapshot(&conn, &rep, date("2024-03-05"), &fields("b"), "2024-03-05T06:00:00Z").unwrap();

        let days = PlanningRepository::days_with_entries(
            &conn,
            &rep,
            date("2024-03-01"),
            date("2024-04-01"),
        )
        .unwrap();
        assert_eq!(days, vec![date("2024-03-01"), date("2024-03-05")]);
    }

    #[test]
    fn count_days_in_range_is_plan_rows_only() {
        let conn = setup_db();
        let rep = insert_user(&conn, "rep");
        PlanningRepository::insert(&conn, &rep, date("2024-03-01"), &fields("a"), "2024-03-01T06:00:00Z").unwrap();
        PlanningRepository::append_snapshot(&conn, &rep, date("2024-03-05"), &fields("b"), "2024-03-05T06:00:00Z").unwrap();

        let count = PlanningRepository::count_days_in_range(
            &conn,
            &rep,
            date("2024-03-01"),
            date("2024-04-01"),
        )
        .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn years_with_plans_descending() {
        let conn = setup_db();
        let rep = insert_user(&conn, "rep");
        PlanningRepository::insert(&conn, &rep, date("2023-06-01"), &fields("a"), "2023-06-01T06:00:00Z").unwrap();
        PlanningRepository::insert(&conn, &rep, date("2024-03-01"), &fields("b"), "2024-03-01T06:00:00Z").unwrap();

        let years = PlanningRepository::years_with_plans(&conn, &rep).unwrap();
        assert_eq!(years, vec![2024, 2023]);
    }

    #[test]
    fn delete_day_removes_plan_and_snapshots() {
        let conn = setup_db();
        let rep = insert_user(&conn, "rep");
        let day = date("2024-03-01");
        PlanningRepository::insert(&conn, &rep, day, &fields("a"), "2024-03-01T06:00:00Z").unwrap();
        PlanningRepository::append_snapshot(&conn, &rep, day, &fields("a"), "2024-03-01T06:00:00Z").unwrap();
        PlanningRepository::append_snapshot(&conn, &rep, day, &fields("b"), "2024-03-01T07:00:00Z").unwrap();

        let deleted = PlanningRepository::delete_day(&conn, &rep, day).unwrap();
        assert_eq!(deleted, 3);
        assert!(PlanningRepository::get_for_day(&conn, &rep, day).unwrap().is_none());
    }
}
