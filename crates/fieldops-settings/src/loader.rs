//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`FieldOpsSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply `FIELDOPS_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::FieldOpsSettings;

/// Resolve the default settings file path (`~/.fieldops/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".fieldops").join("settings.json")
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<FieldOpsSettings> {
    let defaults = serde_json::to_value(FieldOpsSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: FieldOpsSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules; invalid values are silently
/// ignored (falling back to file/default).
pub fn apply_env_overrides(settings: &mut FieldOpsSettings) {
    if let Some(v) = read_env_string("FIELDOPS_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("FIELDOPS_PORT") {
        settings.server.port = v;
    }
    if let Some(v) = read_env_string("FIELDOPS_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = read_env_u32("FIELDOPS_POOL_SIZE", 1, 64) {
        settings.database.pool_size = v;
    }
    if let Some(v) = read_env_string("FIELDOPS_JWT_SECRET") {
        settings.auth.jwt_secret = v;
    }
    if let Some(v) = read_env_u64("FIELDOPS_TOKEN_TTL_HOURS", 1, 24 * 30) {
        settings.auth.token_ttl_hours = v;
    }
    if let Some(v) = read_env_i32("FIELDOPS_UTC_OFFSET_HOURS", -12, 14) {
        settings.org.utc_offset_hours = v;
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str) -> Option<u16> {
    std::env::var(name).ok()?.parse().ok()
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let value: u32 = std::env::var(name).ok()?.parse().ok()?;
    (min..=max).contains(&value).then_some(value)
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let value: u64 = std::env::var(name).ok()?.parse().ok()?;
    (min..=max).contains(&value).then_some(value)
}

fn read_env_i32(name: &str, min: i32, max: i32) -> Option<i32> {
    let value: i32 = std::env::var(name).ok()?.parse().ok()?;
    (min..=max).contains(&value).then_some(value)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
