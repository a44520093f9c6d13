//! Request handlers, one module per API area.

pub mod auth;
pub mod departments;
pub mod health;
pub mod notifications;
pub mod planning;
pub mod reports;
pub mod targets;
pub mod tasks;
pub mod trades;
pub mod users;

use axum::Json;
use rusqlite::Connection;
use serde_json::{Map, Value};

use fieldops_access::is_in_scope;
use fieldops_users::User;

use crate::errors::ApiResult;

/// Wrap a JSON object payload in the `{success: true, ...}` envelope.
pub(crate) fn success(payload: Value) -> Json<Value> {
    let mut map = match payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            let _ = map.insert("data".to_string(), other);
            map
        }
    };
    let _ = map.insert("success".to_string(), Value::Bool(true));
    Json(Value::Object(map))
}

/// Resolve which user's records a view request targets.
///
/// Admins may view anyone; managers anyone in scope (silently falling
/// back to themselves otherwise, like the legacy UI expects); plain
/// users always themselves.
pub(crate) fn resolve_view_user(
    conn: &Connection,
    actor: &User,
    requested: Option<&str>,
) -> ApiResult<String> {
    match requested {
        Some(user_id) if actor.is_admin() => Ok(user_id.to_string()),
        Some(user_id) if actor.is_department_manager() && is_in_scope(conn, actor, user_id)? => {
            Ok(user_id.to_string())
        }
        _ => Ok(actor.id.clone()),
    }
}
