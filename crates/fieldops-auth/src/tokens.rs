//! HS256 bearer tokens.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use fieldops_core::{OrgClock, Role};

use crate::errors::Result;

/// Claims carried in every issued token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Login name at issue time.
    pub username: String,
    /// System role at issue time. Authorization decisions still load
    /// the fresh user row; this is informational.
    pub role: Role,
    /// Expiry as a unix timestamp.
    pub exp: usize,
}

/// Issue a token for a user, expiring `ttl_hours` from the clock's now.
pub fn issue_token(
    secret: &str,
    clock: &OrgClock,
    user_id: &str,
    username: &str,
    role: Role,
    ttl_hours: u64,
) -> Result<String> {
    let ttl_secs = i64::try_from(ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX);
    let exp = clock.now_utc().timestamp().saturating_add(ttl_secs);
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role,
        exp: usize::try_from(exp).unwrap_or(0),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Decode and validate a token (signature and expiry).
pub fn verify_token(secret: &str, token: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issue_and_verify_roundtrip() {
        let clock = OrgClock::default();
        let token =
            issue_token(SECRET, &clock, "user-1", "kemal", Role::User, 24).unwrap();
        let claims = verify_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username, "kemal");
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn wrong_secret_rejected() {
        let clock = OrgClock::default();
        let token =
            issue_token(SECRET, &clock, "user-1", "kemal", Role::Admin, 24).unwrap();
        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        // A clock pinned far in the past produces an already-expired exp.
        let clock = OrgClock::fixed("2020-01-01T00:00:00Z", 0).unwrap();
        let token = issue_token(SECRET, &clock, "user-1", "kemal", Role::User, 1).unwrap();
        assert!(verify_token(SECRET, &token).is_err());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(verify_token(SECRET, "not.a.token").is_err());
    }
}
