//! User administration handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use fieldops_auth::hash_password;
use fieldops_core::Role;
use fieldops_users::{
    ActivityLogRepository, DirectoryService, UserCreateParams, UserRepository, UserUpdateParams,
};

use crate::errors::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::handlers::success;
use crate::state::AppState;

/// GET /api/users — admin: the full directory.
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    let users = UserRepository::list(&conn)?;
    Ok(success(json!({"users": users})))
}

#[derive(Deserialize)]
pub(crate) struct CreateUserRequest {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    role: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    representative_code: Option<String>,
    #[serde(default)]
    department_id: Option<String>,
    #[serde(default)]
    department_role: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

/// POST /api/users — admin: create a user with an explicit role.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    auth.require_admin()?;
    for (field, value) in [
        ("username", &body.username),
        ("password", &body.password),
        ("first_name", &body.first_name),
        ("last_name", &body.last_name),
        ("role", &body.role),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{field} is required")));
        }
    }
    let role = Role::parse(&body.role)?;
    let representative_code = body
        .representative_code
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty());

    let conn = state.conn()?;
    let user = DirectoryService::create_user(
        &conn,
        &UserCreateParams {
            username: body.username,
            email: body.email.filter(|e| !e.is_empty()),
            password_hash: hash_password(&body.password)?,
            role: Some(role),
            first_name: body.first_name,
            last_name: body.last_name,
            department_id: body.department_id.filter(|d| !d.is_empty()),
            department_role: body.department_role,
            representative_code,
            phone: body.phone,
            region: body.region,
        },
    )?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "user_created",
        Some(&format!("created user: {} ({})", user.username, user.role.as_sql())),
        None,
    )?;
    Ok((StatusCode::CREATED, success(json!({"user": user}))))
}

#[derive(Deserialize)]
pub(crate) struct UpdateUserRequest {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    representative_code: Option<String>,
    #[serde(default)]
    department_role: Option<String>,
    #[serde(default)]
    department_id: Option<String>,
}

/// PUT /api/users/{id} — admin: role, activation, and codes.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let role = body.role.as_deref().map(Role::parse).transpose()?;

    let conn = state.conn()?;
    let updates = UserUpdateParams {
        role,
        is_active: body.is_active,
        representative_code: body.representative_code.map(|c| {
            let trimmed = c.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }),
        department_role: body.department_role.map(Some),
        department_id: body
            .department_id
            .map(|d| (!d.is_empty()).then_some(d)),
        ..Default::default()
    };
    let user = DirectoryService::update_user(&conn, &auth.0, &user_id, &updates)?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "user_update",
        Some(&format!("updated user: {}", user.username)),
        None,
    )?;
    Ok(success(json!({"user": user})))
}

/// DELETE /api/users/{id} — admin: soft delete (deactivate and
/// anonymize).
pub async fn soft_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    DirectoryService::soft_delete_user(&conn, &auth.0, &user_id)?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "user_delete",
        Some(&format!("soft-deleted user: {user_id}")),
        None,
    )?;
    Ok(success(json!({"message": "user deactivated"})))
}

#[derive(Deserialize)]
pub(crate) struct HardDeleteQuery {
    #[serde(default)]
    reassign_to: Option<String>,
    #[serde(default)]
    purge: Option<u8>,
}

/// DELETE /api/users/{id}/hard-delete — admin: permanent removal.
///
/// Requires `reassign_to` or `purge=1` when dependent rows exist.
pub async fn hard_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    Query(query): Query<HardDeleteQuery>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    DirectoryService::hard_delete_user(
        &conn,
        &auth.0,
        &user_id,
        query.reassign_to.as_deref(),
        query.purge == Some(1),
    )?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "user_hard_deleted",
        Some(&format!("hard-deleted user: {user_id}")),
        None,
    )?;
    Ok(success(json!({"message": "user permanently deleted"})))
}

#[derive(Deserialize)]
pub(crate) struct ResetPasswordRequest {
    #[serde(default)]
    new_password: String,
}

/// POST /api/users/{id}/reset-password — admin.
pub async fn reset_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    if body.new_password.len() < 6 {
        return Err(ApiError::Validation(
            "new password must be at least 6 characters".to_string(),
        ));
    }
    let conn = state.conn()?;
    let user = UserRepository::get(&conn, &user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {user_id}")))?;
    UserRepository::set_password_hash(&conn, &user.id, &hash_password(&body.new_password)?)?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "password_reset",
        Some(&format!("reset password for: {}", user.username)),
        None,
    )?;
    Ok(success(json!({"message": "password reset"})))
}

#[derive(Deserialize)]
pub(crate) struct ReassignRequest {
    #[serde(default)]
    to_user_id: String,
}

/// POST /api/users/{id}/reassign-records — admin or manager: move all
/// sales and return rows to another user.
pub async fn reassign_records(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(from_user_id): Path<String>,
    Json(body): Json<ReassignRequest>,
) -> ApiResult<Json<Value>> {
    auth.require_admin_or_manager()?;
    if body.to_user_id.is_empty() {
        return Err(ApiError::Validation("to_user_id is required".to_string()));
    }
    let conn = state.conn()?;
    DirectoryService::reassign_records(&conn, &auth.0, &from_user_id, &body.to_user_id)?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "records_reassign",
        Some(&format!("reassigned records: {from_user_id} -> {}", body.to_user_id)),
        None,
    )?;
    Ok(success(json!({"message": "sales and return records reassigned"})))
}

#[derive(Deserialize)]
pub(crate) struct ActivityLogQuery {
    #[serde(default)]
    limit: Option<u32>,
}

/// GET /api/activity-logs — admin: the audit trail, newest first.
pub async fn activity_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ActivityLogQuery>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    let limit = query.limit.unwrap_or(100).min(500);
    let logs = ActivityLogRepository::list(&conn, limit)?;
    Ok(success(json!({"logs": logs})))
}
