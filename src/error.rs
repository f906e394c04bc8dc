//! Authentication error taxonomy.
//!
//! The distinctions below exist for logging and tests only. At the HTTP
//! boundary every one of them collapses to the same uniform rejection so a
//! caller cannot tell an unknown account from a bad password or a dead
//! upstream (see `gateway`).

use thiserror::Error;

/// Everything that can go wrong between "credentials received" and
/// "claims returned".
#[derive(Debug, Error)]
pub enum AuthError {
    /// The account directory has no entry for the requested username.
    #[error("account not found")]
    AccountNotFound,

    /// The account directory could not be reached or answered garbage.
    #[error("account directory unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The derived key matched none of the account's published keys.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The presented token could not be parsed as a JWT at all.
    #[error("malformed token: {0}")]
    TokenInvalid(String),

    /// The presented token is past its embedded expiry.
    #[error("token expired")]
    TokenExpired,

    /// The token parsed but its signature does not verify against the
    /// configured secret.
    #[error("token signature mismatch")]
    SignatureMismatch,
}

impl AuthError {
    /// Shorthand for upstream failures carrying a reason.
    pub fn upstream(reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(reason.into())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidSignature => Self::SignatureMismatch,
            _ => Self::TokenInvalid(err.to_string()),
        }
    }
}
