//! Auth error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. Deliberately a single
    /// variant so the two cases are indistinguishable to callers.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The account exists but is deactivated.
    #[error("account is not active")]
    Inactive,

    /// Password hashing or hash parsing failed.
    #[error("password hash error: {0}")]
    Hash(String),

    /// Token encoding/decoding failed or the token expired.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// Directory lookup failed.
    #[error(transparent)]
    Users(#[from] fieldops_users::UsersError),

    /// SQL execution failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_display() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid username or password"
        );
    }

    #[test]
    fn inactive_display() {
        assert_eq!(AuthError::Inactive.to_string(), "account is not active");
    }
}
