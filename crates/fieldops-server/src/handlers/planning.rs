//! Planning and calendar handlers. "Today" is always the organization
//! calendar date, never the client's.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Datelike;
use serde::Deserialize;
use serde_json::{json, Value};

use fieldops_core::clock::parse_date;
use fieldops_planning::{PlanningFields, PlanningService};
use fieldops_tasks::TaskRepository;
use fieldops_users::{DepartmentRepository, UserRepository};

use crate::errors::ApiResult;
use crate::extract::AuthUser;
use crate::handlers::{resolve_view_user, success};
use crate::state::AppState;

/// GET /api/planning/today — the caller's plan and snapshot history.
pub async fn today(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let view = PlanningService::today_view(&conn, &state.clock, &actor.id)?;
    Ok(success(json!({"plan": view.plan, "snapshots": view.snapshots})))
}

/// POST /api/planning/today — upsert within the 24-hour window; always
/// appends a snapshot.
pub async fn save_today(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(fields): Json<PlanningFields>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let plan = PlanningService::save_today(&conn, &state.clock, &actor.id, &fields)?;
    Ok(success(json!({"plan": plan})))
}

#[derive(Deserialize)]
pub(crate) struct MonthQuery {
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    month: Option<u32>,
    #[serde(default)]
    user_id: Option<String>,
}

/// GET /api/planning/month — per-day flags; privileged callers get the
/// capped assignment summaries.
pub async fn month(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<MonthQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let user_id = resolve_view_user(&conn, &actor, query.user_id.as_deref())?;
    let today = state.clock.today();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    let privileged = actor.is_admin() || actor.is_department_manager();

    let days = PlanningService::month_view(&conn, &user_id, year, month, privileged)?;
    Ok(success(json!({"year": year, "month": month, "days": days})))
}

#[derive(Deserialize)]
pub(crate) struct MonthsQuery {
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    user_id: Option<String>,
}

/// GET /api/planning/months — twelve month folders for a year.
pub async fn months(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<MonthsQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let user_id = resolve_view_user(&conn, &actor, query.user_id.as_deref())?;
    let year = query.year.unwrap_or_else(|| state.clock.today().year());
    let months = PlanningService::months(&conn, &user_id, year)?;
    Ok(success(json!({"year": year, "months": months})))
}

#[derive(Deserialize)]
pub(crate) struct YearsQuery {
    #[serde(default)]
    user_id: Option<String>,
}

/// GET /api/planning/years — year folders for the archive browser.
pub async fn years(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<YearsQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let user_id = resolve_view_user(&conn, &actor, query.user_id.as_deref())?;
    let years = PlanningService::years(&conn, &state.clock, &user_id)?;
    Ok(success(json!({"years": years})))
}

#[derive(Deserialize)]
pub(crate) struct DayQuery {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

/// GET /api/planning/day — plan, snapshots, and occurring tasks.
pub async fn day(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<DayQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let user_id = resolve_view_user(&conn, &actor, query.user_id.as_deref())?;
    let date = match query.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => state.clock.today(),
    };
    let detail = PlanningService::day_detail(&conn, &user_id, date)?;
    Ok(success(json!({
        "date": detail.date,
        "plan": detail.plan,
        "snapshots": detail.snapshots,
        "tasks": detail.tasks,
    })))
}

/// DELETE /api/planning/day — admin only: purge a day's plan history.
pub async fn delete_day(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DayQuery>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    let user_id = query.user_id.unwrap_or_else(|| auth.0.id.clone());
    let date = match query.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => state.clock.today(),
    };
    let deleted = PlanningService::delete_day(&conn, &user_id, date)?;
    Ok(success(json!({"deleted": deleted})))
}

#[derive(Deserialize)]
pub(crate) struct ArchiveQuery {
    #[serde(default)]
    department_id: Option<String>,
}

/// GET /api/planning/archive/departments — departments in scope with
/// per-member task statistics.
pub async fn archive_departments(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ArchiveQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let scope = fieldops_access::resolve_scope(&conn, &actor)?;
    let today = state.clock.today();

    let mut departments = if actor.is_admin() {
        DepartmentRepository::list(&conn)?
    } else {
        match actor.department_id.as_deref() {
            Some(department_id) => DepartmentRepository::get(&conn, department_id)?
                .into_iter()
                .collect(),
            None => Vec::new(),
        }
    };
    if let Some(ref wanted) = query.department_id {
        departments.retain(|d| d.id == *wanted);
    }

    let mut rows = Vec::with_capacity(departments.len());
    for department in departments {
        let members = UserRepository::list_by_department(&conn, &department.id)?;
        let mut users = Vec::new();
        for member in members {
            if !scope.contains(&member.id) {
                continue;
            }
            let stats = TaskRepository::stats_for_assignee(&conn, &member.id, today)?;
            users.push(json!({
                "id": member.id,
                "name": member.full_name(),
                "username": member.username,
                "stats": stats,
            }));
        }
        rows.push(json!({
            "id": department.id,
            "name": department.name,
            "users": users,
        }));
    }
    Ok(success(json!({"departments": rows})))
}
