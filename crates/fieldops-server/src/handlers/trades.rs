//! Sale and return ledger handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use fieldops_access::{has_permission, is_in_scope, resolve_scope};
use fieldops_core::clock::parse_date;
use fieldops_core::permissions::actions;
use fieldops_sales::{SalesService, TradeCreateInput, TradeFilter, TradeRepository};
use fieldops_users::ActivityLogRepository;

use crate::errors::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::handlers::success;
use crate::state::AppState;

#[derive(Deserialize)]
pub(crate) struct TradeQuery {
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    representative_id: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

fn build_filter(
    conn: &rusqlite::Connection,
    actor: &fieldops_users::User,
    query: &TradeQuery,
) -> ApiResult<TradeFilter> {
    let representative_ids = match query.representative_id.as_deref().filter(|s| !s.is_empty()) {
        Some(representative_id) => {
            if !is_in_scope(conn, actor, representative_id)? {
                return Err(ApiError::Forbidden(
                    "no access to this representative".to_string(),
                ));
            }
            Some(vec![representative_id.to_string()])
        }
        None => resolve_scope(conn, actor)?.member_ids(),
    };
    Ok(TradeFilter {
        representative_ids,
        start_date: query
            .start_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_date)
            .transpose()?,
        end_date: query
            .end_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_date)
            .transpose()?,
    })
}

/// GET /api/sales — scope- and date-filtered sales.
pub async fn list_sales(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<TradeQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let filter = build_filter(&conn, &actor, &query)?;
    let sales = TradeRepository::list_sales(&conn, &filter)?;
    Ok(success(json!({"sales": sales})))
}

/// POST /api/sales — requires the `sales`/`edit` permission; records
/// for the caller.
pub async fn create_sale(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<TradeCreateInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let conn = state.conn()?;
    if !has_permission(&conn, &actor, "sales", actions::EDIT)? {
        return Err(ApiError::Forbidden(
            "sales edit permission required".to_string(),
        ));
    }
    let sale = SalesService::record_sale(&conn, &actor.id, &input)?;
    ActivityLogRepository::record(
        &conn,
        &actor.id,
        "sale_create",
        Some(&format!("sale recorded: {}", sale.product_name)),
        None,
    )?;
    Ok((StatusCode::CREATED, success(json!({"id": sale.id}))))
}

/// GET /api/sales/recent — latest recorded sales in scope.
pub async fn recent_sales(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<TradeQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let filter = build_filter(&conn, &actor, &query)?;
    let limit = query.limit.unwrap_or(20).min(100);
    let sales = TradeRepository::recent_sales(&conn, &filter, limit)?;
    Ok(success(json!({"sales": sales})))
}

/// GET /api/returns — scope- and date-filtered returns.
pub async fn list_returns(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<TradeQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let filter = build_filter(&conn, &actor, &query)?;
    let returns = TradeRepository::list_returns(&conn, &filter)?;
    Ok(success(json!({"returns": returns})))
}

/// POST /api/returns — requires the `sales`/`edit` permission.
pub async fn create_return(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<TradeCreateInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let conn = state.conn()?;
    if !has_permission(&conn, &actor, "sales", actions::EDIT)? {
        return Err(ApiError::Forbidden(
            "sales edit permission required".to_string(),
        ));
    }
    let record = SalesService::record_return(&conn, &actor.id, &input)?;
    ActivityLogRepository::record(
        &conn,
        &actor.id,
        "return_create",
        Some(&format!("return recorded: {}", record.product_name)),
        None,
    )?;
    Ok((StatusCode::CREATED, success(json!({"id": record.id}))))
}

/// GET /api/returns/recent — latest recorded returns in scope.
pub async fn recent_returns(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<TradeQuery>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let filter = build_filter(&conn, &actor, &query)?;
    let limit = query.limit.unwrap_or(20).min(100);
    let returns = TradeRepository::recent_returns(&conn, &filter, limit)?;
    Ok(success(json!({"returns": returns})))
}
