//! Login, registration, and profile handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use fieldops_auth::{hash_password, AuthService};
use fieldops_users::{
    ActivityLogRepository, DepartmentRepository, UserCreateParams, UserRepository,
    UserUpdateParams,
};

use crate::errors::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::handlers::success;
use crate::state::AppState;

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let (token, user) = AuthService::login(
        &conn,
        &state.clock,
        &state.settings.auth.jwt_secret,
        state.settings.auth.token_ttl_hours,
        &body.username,
        &body.password,
    )?;
    Ok(success(json!({
        "token": token,
        "user": {
            "id": user.id,
            "username": user.username,
            "role": user.role,
            "full_name": user.full_name(),
        },
    })))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    ActivityLogRepository::record(
        &conn,
        &user.id,
        "logout",
        Some(&format!("user logged out: {}", user.username)),
        None,
    )?;
    Ok(success(json!({"message": "logged out"})))
}

#[derive(Deserialize)]
pub(crate) struct RegisterRequest {
    username: String,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
}

/// POST /auth/register — open self-registration with the plain role.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    for (field, value) in [
        ("username", &body.username),
        ("email", &body.email),
        ("password", &body.password),
        ("first_name", &body.first_name),
        ("last_name", &body.last_name),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{field} is required")));
        }
    }

    let conn = state.conn()?;
    let user = fieldops_users::DirectoryService::create_user(
        &conn,
        &UserCreateParams {
            username: body.username,
            email: Some(body.email),
            password_hash: hash_password(&body.password)?,
            first_name: body.first_name,
            last_name: body.last_name,
            ..Default::default()
        },
    )?;
    ActivityLogRepository::record(
        &conn,
        &user.id,
        "register",
        Some(&format!("new registration: {}", user.username)),
        None,
    )?;
    Ok((
        StatusCode::CREATED,
        success(json!({"user_id": user.id, "message": "registered"})),
    ))
}

#[derive(Deserialize)]
pub(crate) struct ProfileQuery {
    #[serde(default)]
    user_id: Option<String>,
}

/// GET /auth/profile — own profile, or another in-scope user's.
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ProfileQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let user = match query.user_id.as_deref() {
        Some(user_id)
            if actor.is_admin() || fieldops_access::is_in_scope(&conn, &actor, user_id)? =>
        {
            UserRepository::get(&conn, user_id)?
                .ok_or_else(|| ApiError::NotFound(format!("user not found: {user_id}")))?
        }
        _ => actor,
    };

    let department_name = match user.department_id.as_deref() {
        Some(department_id) => {
            DepartmentRepository::get(&conn, department_id)?.map(|d| d.name)
        }
        None => None,
    };

    Ok(success(json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "role": user.role,
        "full_name": user.full_name(),
        "first_name": user.first_name,
        "last_name": user.last_name,
        "representative_code": user.representative_code,
        "phone": user.phone,
        "region": user.region,
        "department_name": department_name,
        "is_active": user.is_active,
        "created_at": user.created_at,
        "last_login": user.last_login,
    })))
}

#[derive(Deserialize)]
pub(crate) struct ProfileUpdateRequest {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// PUT /auth/profile — self-service profile update.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(body): Json<ProfileUpdateRequest>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;

    if let Some(ref username) = body.username {
        if username.trim().is_empty() {
            return Err(ApiError::Validation("username cannot be blank".to_string()));
        }
    }

    let updates = UserUpdateParams {
        username: body.username.filter(|u| *u != actor.username),
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone.map(Some),
        region: body.region.map(Some),
        ..Default::default()
    };
    let _ = fieldops_users::DirectoryService::update_user(&conn, &actor, &actor.id, &updates)?;

    if let Some(password) = body.password.filter(|p| !p.is_empty()) {
        UserRepository::set_password_hash(&conn, &actor.id, &hash_password(&password)?)?;
    }

    ActivityLogRepository::record(&conn, &actor.id, "profile_update", None, None)?;
    Ok(success(json!({"message": "profile updated"})))
}

#[derive(Deserialize)]
pub(crate) struct ChangePasswordRequest {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
}

/// POST /auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    AuthService::change_password(&conn, &actor, &body.current_password, &body.new_password)?;
    Ok(success(json!({"message": "password changed"})))
}
