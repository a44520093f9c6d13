//! API error taxonomy and response mapping.
//!
//! Every handler error becomes `{success: false, error: <message>}`
//! with a conventional status code: 400 validation/conflict, 401
//! unauthenticated, 403 forbidden, 404 not found, 500 internal. The
//! internal message is surfaced in the body; this is an internal tool.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use fieldops_users::DependentCounts;

/// Handler-level error with a fixed HTTP mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input → 400.
    #[error("{0}")]
    Validation(String),

    /// No valid credentials → 401.
    #[error("{0}")]
    Unauthenticated(String),

    /// Role, permission, or scope failure → 403.
    #[error("{0}")]
    Forbidden(String),

    /// Missing entity → 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate unique key → 400 with a descriptive message.
    #[error("{0}")]
    Conflict(String),

    /// Hard delete refused: dependent rows exist → 400 with counts.
    #[error("user has dependent records; reassign them or pass purge")]
    DependentRecords(DependentCounts),

    /// Anything unexpected → 500, message surfaced in the body.
    #[error("{0}")]
    Internal(String),
}

/// Result type for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) | Self::DependentRecords(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = match &self {
            Self::DependentRecords(counts) => json!({
                "success": false,
                "error": self.to_string(),
                "needs_reassign": true,
                "counts": counts,
            }),
            _ => json!({"success": false, "error": self.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

impl From<fieldops_store::StoreError> for ApiError {
    fn from(err: fieldops_store::StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(err: r2d2::Error) -> Self {
        Self::Internal(format!("connection pool error: {err}"))
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Internal(format!("sqlite error: {err}"))
    }
}

impl From<fieldops_core::CoreError> for ApiError {
    fn from(err: fieldops_core::CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<fieldops_auth::AuthError> for ApiError {
    fn from(err: fieldops_auth::AuthError) -> Self {
        use fieldops_auth::AuthError;
        match err {
            AuthError::InvalidCredentials => Self::Unauthenticated(err.to_string()),
            AuthError::Inactive => Self::Forbidden(err.to_string()),
            AuthError::Token(_) => Self::Unauthenticated(err.to_string()),
            AuthError::Validation(message) => Self::Validation(message),
            AuthError::Users(inner) => inner.into(),
            AuthError::Hash(_) | AuthError::Sqlite(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<fieldops_users::UsersError> for ApiError {
    fn from(err: fieldops_users::UsersError) -> Self {
        use fieldops_users::UsersError;
        match err {
            UsersError::UserNotFound(_) | UsersError::DepartmentNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            UsersError::Conflict(message) => Self::Conflict(message),
            UsersError::Forbidden(message) => Self::Forbidden(message),
            UsersError::Validation(message) => Self::Validation(message),
            UsersError::LastActiveAdmin => Self::Validation(err.to_string()),
            UsersError::HasDependents { counts } => Self::DependentRecords(counts),
            UsersError::Core(inner) => inner.into(),
            UsersError::Sqlite(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<fieldops_access::AccessError> for ApiError {
    fn from(err: fieldops_access::AccessError) -> Self {
        use fieldops_access::AccessError;
        match err {
            AccessError::Forbidden(message) => Self::Forbidden(message),
            AccessError::InvalidTransition(message) => Self::Validation(message),
            AccessError::Users(inner) => inner.into(),
            AccessError::Sqlite(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<fieldops_tasks::TaskError> for ApiError {
    fn from(err: fieldops_tasks::TaskError) -> Self {
        use fieldops_tasks::TaskError;
        match err {
            TaskError::NotFound(_) | TaskError::AssigneeNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            TaskError::Access(inner) => inner.into(),
            TaskError::Validation(message) => Self::Validation(message),
            TaskError::Core(inner) => inner.into(),
            TaskError::Users(inner) => inner.into(),
            TaskError::Sqlite(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<fieldops_notify::NotifyError> for ApiError {
    fn from(err: fieldops_notify::NotifyError) -> Self {
        use fieldops_notify::NotifyError;
        match err {
            NotifyError::NotFound(_) => Self::NotFound(err.to_string()),
            NotifyError::Users(inner) => inner.into(),
            NotifyError::Sqlite(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<fieldops_planning::PlanningError> for ApiError {
    fn from(err: fieldops_planning::PlanningError) -> Self {
        use fieldops_planning::PlanningError;
        match err {
            PlanningError::EditWindowClosed => Self::Validation(err.to_string()),
            PlanningError::Validation(message) => Self::Validation(message),
            PlanningError::Core(inner) => inner.into(),
            PlanningError::Tasks(inner) => inner.into(),
            PlanningError::Users(inner) => inner.into(),
            PlanningError::Sqlite(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<fieldops_sales::SalesError> for ApiError {
    fn from(err: fieldops_sales::SalesError) -> Self {
        use fieldops_sales::SalesError;
        match err {
            SalesError::NotFound(_) => Self::NotFound(err.to_string()),
            SalesError::DuplicateTarget => Self::Conflict(err.to_string()),
            SalesError::Validation(message) => Self::Validation(message),
            SalesError::Core(inner) => inner.into(),
            SalesError::Users(inner) => inner.into(),
            SalesError::Sqlite(_) => Self::Internal(err.to_string()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthenticated("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        // Conflicts are 400s with a descriptive message, not 409s.
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_target_maps_to_conflict() {
        let err: ApiError = fieldops_sales::SalesError::DuplicateTarget.into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn edit_window_maps_to_validation() {
        let err: ApiError = fieldops_planning::PlanningError::EditWindowClosed.into();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn dependent_records_body_carries_counts() {
        let err = ApiError::DependentRecords(DependentCounts {
            sales: 2,
            ..Default::default()
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
