//! Department administration handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use fieldops_users::{
    ActivityLogRepository, DepartmentCreateParams, DepartmentRepository, DepartmentUpdateParams,
    DirectoryService, PermissionEntry, PermissionRepository, UserRepository,
};

use crate::errors::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::handlers::success;
use crate::state::AppState;

/// GET /auth/departments — admin: all departments with manager names
/// and member counts.
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    let mut rows = Vec::new();
    for department in DepartmentRepository::list(&conn)? {
        let manager_name = match department.manager_id.as_deref() {
            Some(manager_id) => UserRepository::get(&conn, manager_id)?.map(|u| u.full_name()),
            None => None,
        };
        let user_count = DepartmentRepository::user_count(&conn, &department.id)?;
        rows.push(json!({
            "id": department.id,
            "name": department.name,
            "description": department.description,
            "default_role_title": department.default_role_title,
            "manager_id": department.manager_id,
            "manager_name": manager_name,
            "is_active": department.is_active,
            "user_count": user_count,
            "created_at": department.created_at,
        }));
    }
    Ok(success(json!({"departments": rows})))
}

#[derive(Deserialize)]
pub(crate) struct CreateDepartmentRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    manager_id: Option<String>,
    #[serde(default)]
    default_role_title: Option<String>,
}

/// POST /auth/departments — admin.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateDepartmentRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    auth.require_admin()?;
    let conn = state.conn()?;
    let department = DirectoryService::create_department(
        &conn,
        &DepartmentCreateParams {
            name: body.name,
            description: body.description,
            manager_id: body.manager_id.filter(|m| !m.is_empty()),
            default_role_title: body.default_role_title,
        },
    )?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "department_create",
        Some(&format!("created department: {}", department.name)),
        None,
    )?;
    Ok((StatusCode::CREATED, success(json!({"department": department}))))
}

/// GET /auth/departments/{id} — admin.
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(department_id): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    let department = DepartmentRepository::get(&conn, &department_id)?
        .ok_or_else(|| ApiError::NotFound(format!("department not found: {department_id}")))?;
    let manager_name = match department.manager_id.as_deref() {
        Some(manager_id) => UserRepository::get(&conn, manager_id)?.map(|u| u.full_name()),
        None => None,
    };
    Ok(success(json!({
        "department": {
            "id": department.id,
            "name": department.name,
            "description": department.description,
            "default_role_title": department.default_role_title,
            "manager_id": department.manager_id,
            "manager_name": manager_name,
            "is_active": department.is_active,
            "created_at": department.created_at,
        }
    })))
}

#[derive(Deserialize)]
pub(crate) struct UpdateDepartmentRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    /// `""` clears the manager (legacy clients cannot send null).
    #[serde(default)]
    manager_id: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    default_role_title: Option<String>,
}

/// PUT /auth/departments/{id} — admin. Manager changes apply the
/// promotion/demotion rules.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(department_id): Path<String>,
    Json(body): Json<UpdateDepartmentRequest>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    let department = DirectoryService::update_department(
        &conn,
        &department_id,
        &DepartmentUpdateParams {
            name: body.name,
            description: body.description.map(Some),
            manager_id: body.manager_id.map(|m| (!m.is_empty()).then_some(m)),
            is_active: body.is_active,
            default_role_title: body.default_role_title.map(Some),
        },
    )?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "department_update",
        Some(&format!("updated department: {}", department.name)),
        None,
    )?;
    Ok(success(json!({"department": department})))
}

/// GET /auth/departments/{id}/permissions — admin.
pub async fn permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(department_id): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    let _ = DepartmentRepository::get(&conn, &department_id)?
        .ok_or_else(|| ApiError::NotFound(format!("department not found: {department_id}")))?;
    let permissions = PermissionRepository::list(&conn, &department_id)?;
    Ok(success(json!({"permissions": permissions})))
}

#[derive(Deserialize)]
pub(crate) struct SetPermissionsRequest {
    #[serde(default)]
    permissions: Vec<PermissionEntry>,
}

/// POST /auth/departments/{id}/permissions — admin: replace the set.
pub async fn set_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(department_id): Path<String>,
    Json(body): Json<SetPermissionsRequest>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    let department = DepartmentRepository::get(&conn, &department_id)?
        .ok_or_else(|| ApiError::NotFound(format!("department not found: {department_id}")))?;
    PermissionRepository::replace_all(&conn, &department_id, &body.permissions)?;
    ActivityLogRepository::record(
        &conn,
        &auth.0.id,
        "department_permissions_update",
        Some(&format!("updated permissions: {}", department.name)),
        None,
    )?;
    Ok(success(json!({"message": "department permissions updated"})))
}

/// GET /auth/departments/{id}/users — admin: the member list.
pub async fn members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(department_id): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    let _ = DepartmentRepository::get(&conn, &department_id)?
        .ok_or_else(|| ApiError::NotFound(format!("department not found: {department_id}")))?;
    let users = UserRepository::list_by_department(&conn, &department_id)?;
    Ok(success(json!({"users": users})))
}

#[derive(Deserialize)]
pub(crate) struct AddMemberRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    department_role: Option<String>,
}

/// POST /auth/departments/{id}/users — admin: add a member.
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(department_id): Path<String>,
    Json(body): Json<AddMemberRequest>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    if body.user_id.is_empty() {
        return Err(ApiError::Validation("user_id is required".to_string()));
    }
    let conn = state.conn()?;
    DirectoryService::add_department_member(
        &conn,
        &department_id,
        &body.user_id,
        body.department_role.as_deref(),
    )?;
    Ok(success(json!({"message": "user added to department"})))
}

/// DELETE /auth/departments/{id}/users/{user_id} — admin.
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((department_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let conn = state.conn()?;
    DirectoryService::remove_department_member(&conn, &department_id, &user_id)?;
    Ok(success(json!({"message": "user removed from department"})))
}

/// GET /auth/my-department — the caller's own department.
pub async fn my_department(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let department_id = actor
        .department_id
        .as_deref()
        .ok_or_else(|| ApiError::NotFound("user is not in a department".to_string()))?;
    let department = DepartmentRepository::get(&conn, department_id)?
        .ok_or_else(|| ApiError::NotFound("department not found".to_string()))?;
    let manager_name = match department.manager_id.as_deref() {
        Some(manager_id) => UserRepository::get(&conn, manager_id)?.map(|u| u.full_name()),
        None => None,
    };
    Ok(success(json!({
        "department": {
            "id": department.id,
            "name": department.name,
            "description": department.description,
            "manager_id": department.manager_id,
            "manager_name": manager_name,
            "is_active": department.is_active,
        }
    })))
}

/// GET /api/departments/simple — a minimal picker list: admins see
/// every department, everyone else only their own.
pub async fn simple_list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let departments = if actor.is_admin() {
        DepartmentRepository::list(&conn)?
    } else {
        match actor.department_id.as_deref() {
            Some(department_id) => DepartmentRepository::get(&conn, department_id)?
                .into_iter()
                .collect(),
            None => Vec::new(),
        }
    };
    let rows: Vec<Value> = departments
        .iter()
        .map(|d| json!({"id": d.id, "name": d.name}))
        .collect();
    Ok(success(json!({"departments": rows})))
}
