//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use fieldops_auth::verify_token;
use fieldops_core::Role;
use fieldops_users::{User, UserRepository};

use crate::errors::ApiError;
use crate::state::AppState;

/// The authenticated principal, loaded fresh from the directory on
/// every request. Rejects missing/invalid bearer tokens and inactive
/// accounts with 401.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl AuthUser {
    /// 403 unless the principal's role is in the allowed set.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("insufficient role".to_string()))
        }
    }

    /// 403 unless the principal is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require_role(&[Role::Admin])
    }

    /// 403 unless the principal is an admin or department manager.
    pub fn require_admin_or_manager(&self) -> Result<(), ApiError> {
        self.require_role(&[Role::Admin, Role::DepartmentManager])
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("missing bearer token".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthenticated("missing bearer token".to_string()))?;

        let claims = verify_token(&state.settings.auth.jwt_secret, token)
            .map_err(|_| ApiError::Unauthenticated("invalid or expired token".to_string()))?;

        let conn = state.conn()?;
        let user = UserRepository::get(&conn, &claims.sub)
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::Unauthenticated("unknown user".to_string()))?;
        if !user.is_active {
            return Err(ApiError::Unauthenticated("account is not active".to_string()));
        }
        Ok(Self(user))
    }
}
