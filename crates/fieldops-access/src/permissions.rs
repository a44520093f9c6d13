//! Module permission checks.
//!
//! Resolution order for a non-admin principal:
//!
//! 1. No department: deny.
//! 2. The department's wildcard (`*`) row, when present, can grant —
//!    first through its granular map (`all_access` or the action key),
//!    then through its legacy view/edit/delete flags. A wildcard row
//!    never denies; it only short-circuits grants.
//! 3. The specific module row: a granular key answers definitively
//!    (granted or denied); otherwise the legacy flags answer.
//! 4. No row: deny.

use rusqlite::Connection;

use fieldops_core::permissions::WILDCARD_MODULE;
use fieldops_users::{PermissionRepository, User};

use crate::errors::Result;

/// Whether the principal may perform `action` in `module`.
///
/// Admins always pass. Module names are matched lowercased.
pub fn has_permission(
    conn: &Connection,
    principal: &User,
    module: &str,
    action: &str,
) -> Result<bool> {
    if principal.is_admin() {
        return Ok(true);
    }
    let Some(department_id) = principal.department_id.as_deref() else {
        return Ok(false);
    };
    let module = module.to_lowercase();

    if let Some(wildcard) = PermissionRepository::get(conn, department_id, WILDCARD_MODULE)? {
        if let Some(granular) = &wildcard.actions {
            if granular.grants(action) {
                return Ok(true);
            }
        }
        if wildcard.legacy_grants(action) {
            return Ok(true);
        }
    }

    let Some(permission) = PermissionRepository::get(conn, department_id, &module)? else {
        return Ok(false);
    };
    Ok(permission.grants(action))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
