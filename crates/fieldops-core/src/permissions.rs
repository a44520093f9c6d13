//! Department permission model.
//!
//! The legacy store kept granular module actions as an untyped JSON blob
//! next to three boolean columns. Here the blob is a typed map of named
//! boolean capabilities; the legacy view/edit/delete flags remain as a
//! fallback tier consulted only when the granular map lacks the
//! requested key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Module name that grants across all modules unless a specific entry
/// overrides it.
pub const WILDCARD_MODULE: &str = "*";

/// Legacy permission action names backed by the boolean columns.
pub mod actions {
    /// Read access to a module.
    pub const VIEW: &str = "view";
    /// Write access to a module.
    pub const EDIT: &str = "edit";
    /// Delete access within a module.
    pub const DELETE: &str = "delete";
}

/// Granular per-module capability map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GranularActions {
    /// Blanket grant for every action of the module.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub all_access: bool,
    /// Named capabilities, e.g. `assign`, `export`.
    #[serde(flatten)]
    pub actions: BTreeMap<String, bool>,
}

impl GranularActions {
    /// Look up a named action. `None` means the map does not speak to it
    /// and the caller should fall back to the legacy flags.
    pub fn get(&self, action: &str) -> Option<bool> {
        self.actions.get(action).copied()
    }

    /// Whether this map affirmatively grants the action.
    pub fn grants(&self, action: &str) -> bool {
        self.all_access || self.get(action) == Some(true)
    }
}

/// One department permission row: legacy flags plus the optional
/// granular map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModulePermission {
    /// Row ID.
    pub id: String,
    /// Owning department.
    pub department_id: String,
    /// Lowercased module name, or [`WILDCARD_MODULE`].
    pub module_name: String,
    /// Legacy read flag.
    pub can_view: bool,
    /// Legacy write flag.
    pub can_edit: bool,
    /// Legacy delete flag.
    pub can_delete: bool,
    /// Granular capability map, when configured.
    pub actions: Option<GranularActions>,
    /// Creation timestamp.
    pub created_at: String,
}

impl ModulePermission {
    /// Consult only the legacy boolean tier for the given action.
    pub fn legacy_grants(&self, action: &str) -> bool {
        match action {
            actions::VIEW => self.can_view,
            actions::EDIT => self.can_edit,
            actions::DELETE => self.can_delete,
            _ => false,
        }
    }

    /// Resolve an action against this row: the granular map wins when it
    /// has the key, the legacy flags answer otherwise.
    pub fn grants(&self, action: &str) -> bool {
        if let Some(granular) = &self.actions {
            if let Some(decision) = granular.get(action) {
                return decision;
            }
        }
        self.legacy_grants(action)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
