//! Monthly target handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use fieldops_access::is_in_scope;
use fieldops_sales::{BulkTargetEntry, SalesService, TargetRepository};
use fieldops_users::{ActivityLogRepository, UserRepository};

use crate::errors::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::handlers::success;
use crate::state::AppState;

/// GET /api/targets — admins see every target, others their own.
pub async fn list(State(state): State<AppState>, AuthUser(actor): AuthUser) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let targets = if actor.is_admin() {
        TargetRepository::list_all(&conn)?
    } else {
        TargetRepository::list_for_user(&conn, &actor.id)?
    };
    Ok(success(json!({"targets": targets})))
}

#[derive(Deserialize)]
pub(crate) struct CreateTargetRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    month: Option<u32>,
    #[serde(default)]
    target_amount: Option<f64>,
}

/// POST /api/targets — admin or manager, within scope. A second target
/// for the same month is a conflict.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateTargetRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    auth.require_admin_or_manager()?;
    let (Some(year), Some(month), Some(target_amount)) =
        (body.year, body.month, body.target_amount)
    else {
        return Err(ApiError::Validation(
            "user_id, year, month, and target_amount are required".to_string(),
        ));
    };
    if body.user_id.is_empty() {
        return Err(ApiError::Validation("user_id is required".to_string()));
    }

    let conn = state.conn()?;
    let user = UserRepository::get(&conn, &body.user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {}", body.user_id)))?;
    if !is_in_scope(&conn, &auth.0, &user.id)? {
        return Err(ApiError::Forbidden(
            "not allowed to set targets for this user".to_string(),
        ));
    }

    let target = SalesService::create_target(&conn, &user.id, year, month, target_amount)?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "target_create",
        Some(&format!("target created: {} {}/{}", user.username, year, month)),
        None,
    )?;
    Ok((StatusCode::CREATED, success(json!({"target": target}))))
}

#[derive(Deserialize)]
pub(crate) struct UpdateTargetRequest {
    #[serde(default)]
    target_amount: Option<f64>,
}

/// PUT /api/targets/{id} — admin or manager.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<String>,
    Json(body): Json<UpdateTargetRequest>,
) -> ApiResult<Json<Value>> {
    auth.require_admin_or_manager()?;
    let Some(target_amount) = body.target_amount else {
        return Err(ApiError::Validation("target_amount is required".to_string()));
    };
    let conn = state.conn()?;
    let target = TargetRepository::update_amount(&conn, &target_id, target_amount)?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "target_update",
        Some(&format!("target updated: {target_id}")),
        None,
    )?;
    Ok(success(json!({"target": target})))
}

/// DELETE /api/targets/{id} — admin or manager.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_admin_or_manager()?;
    let conn = state.conn()?;
    if !TargetRepository::delete(&conn, &target_id)? {
        return Err(ApiError::NotFound(format!("target not found: {target_id}")));
    }
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "target_delete",
        Some(&format!("target deleted: {target_id}")),
        None,
    )?;
    Ok(success(json!({"message": "target deleted"})))
}

/// GET /api/targets/representative/{id} — targets joined with realized
/// sales, for one in-scope representative.
pub async fn representative_targets(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_admin_or_manager()?;
    let conn = state.conn()?;
    let user = UserRepository::get(&conn, &user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {user_id}")))?;
    if !is_in_scope(&conn, &auth.0, &user.id)? {
        return Err(ApiError::Forbidden("user is outside your scope".to_string()));
    }
    let targets = SalesService::targets_with_actuals(&conn, &user.id)?;
    Ok(success(json!({
        "representative_name": user.full_name(),
        "targets": targets,
    })))
}

#[derive(Deserialize)]
pub(crate) struct BulkCreateRequest {
    #[serde(default)]
    targets: Vec<BulkTargetEntry>,
}

/// POST /api/targets/bulk-create — admin: many targets at once;
/// existing months are skipped.
pub async fn bulk_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<BulkCreateRequest>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    if body.targets.is_empty() {
        return Err(ApiError::Validation("targets list is empty".to_string()));
    }
    let conn = state.conn()?;
    let (created, skipped) = SalesService::bulk_create_targets(&conn, &body.targets)?;
    Ok(success(json!({"created": created, "skipped": skipped})))
}
