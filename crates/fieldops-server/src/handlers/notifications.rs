//! Notification handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use fieldops_notify::{dispatch_read_receipt, NotificationRepository};

use crate::errors::ApiResult;
use crate::extract::AuthUser;
use crate::handlers::success;
use crate::state::AppState;

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    unread: Option<bool>,
}

/// GET /api/notifications — the caller's notifications, newest first.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let notifications = NotificationRepository::list_for_user(
        &conn,
        &actor.id,
        query.unread.unwrap_or(false),
        50,
    )?;
    Ok(success(json!({"notifications": notifications})))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let count = NotificationRepository::unread_count(&conn, &actor.id)?;
    Ok(success(json!({"count": count})))
}

/// POST /api/notifications/{id}/read — idempotent mark-read, then a
/// best-effort read receipt to the viewer's manager and the admins.
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(notification_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let already_read = NotificationRepository::get(&conn, &notification_id)?
        .is_some_and(|n| n.is_read && n.to_user_id == actor.id);
    let notification = NotificationRepository::mark_read(&conn, &actor.id, &notification_id)?;

    // Only the first read emits a receipt; re-reads are no-ops.
    if !already_read {
        let _ = dispatch_read_receipt(&conn, &actor, &notification);
    }
    Ok(success(json!({"notification": notification})))
}
