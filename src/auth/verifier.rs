//! Credential verifier: username/password against the on-chain key set.
//!
//! The directory lookup and the key-correspondence check are injected
//! capabilities, so the verifier itself is pure decision logic and testable
//! without a network or real curve math.

use crate::directory::AccountDirectory;
use crate::error::AuthError;
use crate::keys::{self, KeyMatcher, KeyRole};
use std::sync::Arc;

/// The identity a successful verification binds. This is what ends up in
/// token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub username: String,
}

/// Verifies credentials against an account directory.
pub struct CredentialVerifier {
    directory: Arc<dyn AccountDirectory>,
    matcher: Arc<dyn KeyMatcher>,
    role: KeyRole,
}

impl CredentialVerifier {
    pub fn new(
        directory: Arc<dyn AccountDirectory>,
        matcher: Arc<dyn KeyMatcher>,
        role: KeyRole,
    ) -> Self {
        Self {
            directory,
            matcher,
            role,
        }
    }

    /// Decide whether `password` is authentic for `username`.
    ///
    /// Steps: look up the account's role authority, derive the candidate
    /// private key for `(username, password, role)`, then check the candidate
    /// against each published key in listed order; first match wins.
    ///
    /// The derived candidate never leaves this function and is never logged.
    /// Empty or whitespace usernames reject deterministically without a
    /// directory call.
    pub async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<VerifiedUser, AuthError> {
        let name = username.trim();
        if name.is_empty() {
            return Err(AuthError::AccountNotFound);
        }

        let account = self
            .directory
            .get_account(name)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let authority = account
            .authority(self.role)
            .ok_or(AuthError::InvalidCredentials)?;

        // A bad scalar is a deterministic reject, indistinguishable from a
        // wrong password.
        let candidate = keys::derive_private_key(name, password, self.role)
            .map_err(|_| AuthError::InvalidCredentials)?;

        for (published, _weight) in &authority.key_auths {
            if self.matcher.keys_match(&candidate, published) {
                return Ok(VerifiedUser {
                    username: name.to_string(),
                });
            }
        }

        Err(AuthError::InvalidCredentials)
    }
}
