//! Bearer token issuance and validation (HS256 JWT).
//!
//! Tokens are stateless and self-describing: claims are `{ username, iat,
//! exp }`, signed with the configured secret. A token is valid iff its
//! signature verifies against the current secret AND it has not expired;
//! there is no revocation list and no server-side session state.

use crate::error::AuthError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The claims payload embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The verified account name.
    pub username: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Mints and validates bearer tokens.
///
/// The signing secret is immutable process-wide configuration, handed in at
/// construction, never hard-coded, never mutated.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Mint a token binding `username`, expiring `ttl` from now.
    ///
    /// Signing is local and infallible for well-formed claims; the `Result`
    /// exists only to propagate serializer trouble without panicking.
    pub fn issue(&self, username: &str) -> Result<String, AuthError> {
        self.issue_at(username, Utc::now().timestamp())
    }

    fn issue_at(&self, username: &str, iat: i64) -> Result<String, AuthError> {
        let claims = Claims {
            username: username.to_string(),
            iat,
            exp: iat + self.ttl.as_secs() as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenInvalid(e.to_string()))
    }

    /// Validate a presented token: parse, verify the signature, check expiry
    /// with zero leeway. Returns the embedded claims on success.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn round_trip_preserves_the_username() {
        let token = issuer().issue("alice").unwrap();
        let claims = issuer().validate(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn token_is_three_dot_separated_parts() {
        let token = issuer().issue("alice").unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn expired_token_is_token_expired() {
        let t = issuer();
        // Issued two hours ago with a one-hour TTL: exp is an hour in the past.
        let iat = Utc::now().timestamp() - 7200;
        let token = t.issue_at("alice", iat).unwrap();
        let err = t.validate(&token).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn unexpired_token_validates_right_up_to_its_window() {
        let t = TokenIssuer::new("test-secret", Duration::from_secs(120));
        let iat = Utc::now().timestamp() - 60;
        let token = t.issue_at("alice", iat).unwrap();
        assert!(t.validate(&token).is_ok());
    }

    #[test]
    fn wrong_secret_is_signature_mismatch() {
        let token = issuer().issue("alice").unwrap();
        let other = TokenIssuer::new("different-secret", Duration::from_secs(3600));
        let err = other.validate(&token).unwrap_err();
        assert!(matches!(err, AuthError::SignatureMismatch));
    }

    #[test]
    fn tampered_signature_is_signature_mismatch() {
        let token = issuer().issue("alice").unwrap();
        // Flip one character of the signature segment to a different
        // base64url character, keeping the token structurally valid.
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let sig = &mut parts[2];
        let flipped = if sig.ends_with('A') { 'B' } else { 'A' };
        sig.pop();
        sig.push(flipped);
        let tampered = parts.join(".");

        let err = issuer().validate(&tampered).unwrap_err();
        assert!(matches!(err, AuthError::SignatureMismatch));
    }

    #[test]
    fn tampered_payload_is_signature_mismatch() {
        let token = issuer().issue("alice").unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let payload = &mut parts[1];
        let flipped = if payload.ends_with('A') { 'B' } else { 'A' };
        payload.pop();
        payload.push(flipped);
        let tampered = parts.join(".");

        // Signature is checked before claims are parsed, so any payload edit
        // surfaces as a signature failure.
        let err = issuer().validate(&tampered).unwrap_err();
        assert!(matches!(err, AuthError::SignatureMismatch));
    }

    #[test]
    fn garbage_is_token_invalid() {
        for garbage in ["", "not-a-jwt", "a.b", "a.b.c.d", "...", "!!!.!!!.!!!"] {
            let err = issuer().validate(garbage).unwrap_err();
            assert!(
                matches!(err, AuthError::TokenInvalid(_)),
                "expected TokenInvalid for {garbage:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn token_missing_exp_is_rejected() {
        #[derive(Serialize)]
        struct NoExp {
            username: String,
            iat: i64,
        }
        let bare = encode(
            &Header::new(Algorithm::HS256),
            &NoExp {
                username: "alice".into(),
                iat: Utc::now().timestamp(),
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = issuer().validate(&bare).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[test]
    fn claims_serialize_to_the_wire_shape() {
        let claims = Claims {
            username: "alice".into(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["iat"], 1_700_000_000);
        assert_eq!(json["exp"], 1_700_003_600);
    }
}
