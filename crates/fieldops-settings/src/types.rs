//! Settings tree with compiled defaults.

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOpsSettings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Database settings.
    pub database: DatabaseSettings,
    /// Authentication settings.
    pub auth: AuthSettings,
    /// Organization calendar settings.
    pub org: OrgSettings,
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` auto-assigns).
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// Database settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the `SQLite` database file.
    pub path: String,
    /// Connection pool size.
    pub pool_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "fieldops.db".into(),
            pool_size: 8,
        }
    }
}

/// Authentication settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 signing secret. Override in production.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "fieldops-dev-secret".into(),
            token_ttl_hours: 24,
        }
    }
}

/// Organization calendar settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgSettings {
    /// Fixed UTC offset, in whole hours, used to compute "today".
    pub utc_offset_hours: i32,
}

impl Default for OrgSettings {
    fn default() -> Self {
        Self { utc_offset_hours: 3 }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = FieldOpsSettings::default();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.pool_size, 8);
        assert_eq!(settings.auth.token_ttl_hours, 24);
        assert_eq!(settings.org.utc_offset_hours, 3);
    }

    #[test]
    fn partial_json_fills_from_defaults() {
        let settings: FieldOpsSettings =
            serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.database.path, "fieldops.db");
    }

    #[test]
    fn serde_roundtrip() {
        let settings = FieldOpsSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: FieldOpsSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server.port, settings.server.port);
        assert_eq!(back.org.utc_offset_hours, settings.org.utc_offset_hours);
    }
}
