//! Task workflow handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use fieldops_core::clock::parse_date;
use fieldops_core::{Recurrence, TaskPriority, TaskStatus};
use fieldops_notify::{dispatch_task_event, TaskEvent};
use fieldops_tasks::{
    TaskCreateRequest, TaskFilter, TaskService, TaskUpdateParams, TaskVisibility,
};

use crate::errors::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::handlers::success;
use crate::state::AppState;

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    assigned_to_id: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

/// GET /api/tasks — scope-filtered listing.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    let statuses = match query.status.as_deref() {
        Some(raw) if !raw.is_empty() => raw
            .split(',')
            .filter(|s| !s.is_empty())
            .map(TaskStatus::parse)
            .collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
    };
    let filter = TaskFilter {
        statuses,
        assigned_to_id: query.assigned_to_id.filter(|s| !s.is_empty()),
        due_from: query
            .start_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_date)
            .transpose()?,
        due_until: query
            .end_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_date)
            .transpose()?,
    };

    let conn = state.conn()?;
    let visibility = TaskVisibility::for_user(&actor);
    let tasks = fieldops_tasks::TaskRepository::list(&conn, &visibility, &filter)?;
    Ok(success(json!({"tasks": tasks})))
}

#[derive(Deserialize)]
pub(crate) struct CreateRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    assigned_to_id: Option<String>,
    #[serde(default)]
    assigned_to_ids: Vec<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    is_recurring: bool,
    #[serde(default)]
    recurrence: Option<String>,
}

/// POST /api/tasks — create one task per assignee, then fan out
/// notifications best-effort.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(body): Json<CreateRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut assigned_to_ids = body.assigned_to_ids;
    if let Some(single) = body.assigned_to_id.filter(|s| !s.is_empty()) {
        if assigned_to_ids.is_empty() {
            assigned_to_ids.push(single);
        }
    }

    let request = TaskCreateRequest {
        title: body.title,
        description: body.description,
        assigned_to_ids,
        priority: body.priority.as_deref().map(TaskPriority::parse).transpose()?,
        start_date: body
            .start_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_date)
            .transpose()?,
        due_date: body
            .due_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_date)
            .transpose()?,
        is_recurring: body.is_recurring,
        recurrence: body.recurrence.as_deref().map(Recurrence::parse).transpose()?,
    };

    let conn = state.conn()?;
    let tasks = TaskService::create(&conn, &actor, &request)?;

    // Secondary effect: never fails the committed create.
    for task in &tasks {
        let _ = dispatch_task_event(&conn, task, TaskEvent::Created, &actor);
    }

    let task_ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    Ok((StatusCode::CREATED, success(json!({"task_ids": task_ids}))))
}

/// GET /api/tasks/{id}
pub async fn get(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let task = TaskService::get(&conn, &actor, &task_id)?;
    Ok(success(json!({"task": task})))
}

#[derive(Deserialize)]
pub(crate) struct UpdateRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    assigned_to_id: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    is_recurring: Option<bool>,
    #[serde(default)]
    recurrence: Option<String>,
}

/// Legacy clients clear optional fields by sending `""`, not null.
fn clear_or_date(value: Option<String>) -> ApiResult<Option<Option<NaiveDate>>> {
    match value.as_deref() {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(raw) => Ok(Some(Some(parse_date(raw)?))),
    }
}

/// PUT /api/tasks/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(task_id): Path<String>,
    Json(body): Json<UpdateRequest>,
) -> ApiResult<Json<Value>> {
    let updates = TaskUpdateParams {
        title: body.title,
        description: body.description.map(|d| (!d.is_empty()).then_some(d)),
        status: body.status.as_deref().map(TaskStatus::parse).transpose()?,
        priority: body.priority.as_deref().map(TaskPriority::parse).transpose()?,
        assigned_to_id: body
            .assigned_to_id
            .map(|a| (!a.is_empty()).then_some(a)),
        start_date: clear_or_date(body.start_date)?,
        due_date: clear_or_date(body.due_date)?,
        is_recurring: body.is_recurring,
        recurrence: body.recurrence.as_deref().map(Recurrence::parse).transpose()?,
    };

    let conn = state.conn()?;
    let task = TaskService::update(&conn, &actor, &task_id, &updates)?;
    Ok(success(json!({"task": task})))
}

/// DELETE /api/tasks/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    TaskService::delete(&conn, &actor, &task_id)?;
    Ok(success(json!({"deleted_id": task_id})))
}

/// POST /api/tasks/{id}/approve — assignee: pending/requested →
/// in-progress, then notify.
pub async fn approve(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let task = TaskService::approve(&conn, &actor, &task_id)?;
    let _ = dispatch_task_event(&conn, &task, TaskEvent::Approved, &actor);
    Ok(success(json!({"task": task})))
}

/// POST /api/tasks/{id}/deliver — assignee: open → completed unless
/// overdue, then notify.
pub async fn deliver(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let task = TaskService::deliver(&conn, &actor, &state.clock, &task_id)?;
    let _ = dispatch_task_event(&conn, &task, TaskEvent::Delivered, &actor);
    Ok(success(json!({"task": task})))
}

/// GET /api/tasks/{id}/comments
pub async fn comments(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let comments = TaskService::comments(&conn, &actor, &task_id)?;
    Ok(success(json!({"comments": comments})))
}

#[derive(Deserialize)]
pub(crate) struct CommentRequest {
    #[serde(default)]
    comment: String,
}

/// POST /api/tasks/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(task_id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let conn = state.conn()?;
    let comment_id = TaskService::comment(&conn, &actor, &task_id, &body.comment)?;
    let task = TaskService::get(&conn, &actor, &task_id)?;
    let _ = dispatch_task_event(&conn, &task, TaskEvent::Commented, &actor);
    Ok((StatusCode::CREATED, success(json!({"comment_id": comment_id}))))
}

#[derive(Deserialize)]
pub(crate) struct DueSoonQuery {
    #[serde(default)]
    days: Option<i64>,
}

/// GET /api/tasks/due-soon — open tasks due within the window
/// (default 3 days).
pub async fn due_soon(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<DueSoonQuery>,
) -> ApiResult<Json<Value>> {
    let days = query.days.unwrap_or(3).max(0);
    let today = state.clock.today();
    let until = today
        .checked_add_days(chrono::Days::new(u64::try_from(days).unwrap_or(0)))
        .ok_or_else(|| ApiError::Validation(format!("window too large: {days} days")))?;

    let conn = state.conn()?;
    let visibility = TaskVisibility::for_user(&actor);
    let tasks =
        fieldops_tasks::TaskRepository::due_soon(&conn, &visibility, today, until, 50)?;
    Ok(success(json!({"tasks": tasks})))
}
