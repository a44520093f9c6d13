//! Report handlers.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Datelike;
use serde::Deserialize;
use serde_json::{json, Value};

use fieldops_access::{is_in_scope, resolve_scope, Scope};
use fieldops_core::clock::parse_date;
use fieldops_sales::TradeFilter;
use fieldops_users::UserRepository;

use crate::errors::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::handlers::success;
use crate::state::AppState;

#[derive(Deserialize)]
pub(crate) struct SummaryQuery {
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    representative_id: Option<String>,
}

/// GET /api/reports/summary — totals, return rate, and target
/// completion for the caller's scope (or one in-scope representative).
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let today = state.clock.today();
    let start_date = query
        .start_date
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_date)
        .transpose()?;
    let end_date = query
        .end_date
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_date)
        .transpose()?;

    let (trade_ids, target_ids): (Option<Vec<String>>, Option<Vec<String>>) =
        match query.representative_id.as_deref().filter(|s| !s.is_empty()) {
            Some(representative_id) => {
                if !is_in_scope(&conn, &actor, representative_id)? {
                    return Err(ApiError::Forbidden(
                        "no access to this representative".to_string(),
                    ));
                }
                let ids = vec![representative_id.to_string()];
                (Some(ids.clone()), Some(ids))
            }
            None => match resolve_scope(&conn, &actor)? {
                Scope::Unrestricted => (None, None),
                scope @ Scope::Members(_) => {
                    let ids = scope.member_ids().unwrap_or_default();
                    (Some(ids.clone()), Some(ids))
                }
            },
        };

    let filter = TradeFilter {
        representative_ids: trade_ids,
        start_date,
        end_date,
    };
    let report = fieldops_sales::summary(
        &conn,
        &filter,
        target_ids.as_deref(),
        today.year(),
        today.month(),
    )?;
    Ok(success(json!({
        "total_sales": report.total_sales,
        "total_returns": report.total_returns,
        "net_sales": report.net_sales,
        "return_rate": report.return_rate,
        "target_amount": report.target_amount,
        "target_completion": report.target_completion,
        "period": {"start_date": query.start_date, "end_date": query.end_date},
    })))
}

#[derive(Deserialize)]
pub(crate) struct RepresentativesQuery {
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

/// GET /api/reports/representatives — admin or manager: one
/// performance line per representative in scope.
pub async fn representatives(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RepresentativesQuery>,
) -> ApiResult<Json<Value>> {
    auth.require_admin_or_manager()?;
    let conn = state.conn()?;
    let today = state.clock.today();
    let start_date = query
        .start_date
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_date)
        .transpose()?;
    let end_date = query
        .end_date
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_date)
        .transpose()?;

    let users = if auth.0.is_admin() {
        UserRepository::list(&conn)?
    } else {
        match auth.0.department_id.as_deref() {
            Some(department_id) => UserRepository::list_by_department(&conn, department_id)?,
            None => Vec::new(),
        }
    };

    let report = fieldops_sales::representatives(
        &conn,
        &users,
        start_date,
        end_date,
        today.year(),
        today.month(),
    )?;
    Ok(success(json!({"representatives": report})))
}
