//! Steem key scheme: deterministic role-key derivation plus the chain's
//! wire encodings.
//!
//! A role-scoped private key is derived as `SHA-256(name ‖ role ‖ password)`
//! interpreted as a secp256k1 scalar. Private keys travel as WIF
//! (Base58Check, `0x80` version byte); public keys travel as `STM…` strings
//! (compressed SEC1 point + 4-byte RIPEMD-160 checksum). The curve math
//! itself is delegated to the `k256` crate.
//!
//! Derived private keys exist only for the duration of a verification check:
//! they are never persisted, and `Debug` output is redacted.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// WIF version byte for mainnet private keys.
const WIF_VERSION: u8 = 0x80;

/// Prefix on chain-format public keys.
const PUBLIC_KEY_PREFIX: &str = "STM";

/// Compressed SEC1 point length.
const PUBLIC_KEY_BYTES: usize = 33;

/// Failures in key parsing or derivation. All of them collapse to a generic
/// credential rejection at the verifier.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The derived digest is not a valid secp256k1 scalar (zero or above the
    /// curve order; astronomically rare, but deterministic inputs must
    /// produce a deterministic reject rather than a panic).
    #[error("derived bytes are not a valid secp256k1 scalar")]
    InvalidScalar,

    /// A public key string did not parse as chain format.
    #[error("malformed public key: {0}")]
    MalformedPublicKey(String),

    /// A WIF private key string did not parse.
    #[error("malformed WIF key: {0}")]
    MalformedWif(String),
}

/// Key roles an account publishes authorities for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Owner,
    Active,
    Posting,
    Memo,
}

impl KeyRole {
    /// The lowercase name that participates in key derivation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Active => "active",
            Self::Posting => "posting",
            Self::Memo => "memo",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A secp256k1 private key. Holds the secret scalar; redacted `Debug`.
pub struct PrivateKey {
    secret: SecretKey,
}

impl PrivateKey {
    /// The corresponding public key (compressed point).
    pub fn public_key(&self) -> PublicKey {
        let point = self.secret.public_key().to_encoded_point(true);
        let mut bytes = [0u8; PUBLIC_KEY_BYTES];
        bytes.copy_from_slice(point.as_bytes());
        PublicKey { bytes }
    }

    /// Encode as WIF: Base58Check over `0x80 ‖ scalar`.
    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(33);
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.secret.to_bytes());
        bs58::encode(payload).with_check().into_string()
    }

    /// Decode a WIF string, verifying version byte and checksum.
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        let payload = bs58::decode(wif)
            .with_check(Some(WIF_VERSION))
            .into_vec()
            .map_err(|e| KeyError::MalformedWif(e.to_string()))?;
        // Payload still carries the version byte up front.
        if payload.len() != 33 {
            return Err(KeyError::MalformedWif(format!(
                "expected 32 key bytes, got {}",
                payload.len() - 1
            )));
        }
        let secret = SecretKey::from_slice(&payload[1..]).map_err(|_| KeyError::InvalidScalar)?;
        Ok(Self { secret })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A secp256k1 public key in compressed form.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_BYTES],
}

impl PublicKey {
    /// Encode in chain format: `STM` + Base58(point ‖ RIPEMD-160(point)[..4]).
    pub fn to_steem(&self) -> String {
        let checksum = Ripemd160::digest(self.bytes);
        let mut payload = Vec::with_capacity(PUBLIC_KEY_BYTES + 4);
        payload.extend_from_slice(&self.bytes);
        payload.extend_from_slice(&checksum[..4]);
        format!("{PUBLIC_KEY_PREFIX}{}", bs58::encode(payload).into_string())
    }

    /// Parse a chain-format public key, verifying prefix, checksum, and that
    /// the bytes are a valid curve point.
    pub fn from_steem(s: &str) -> Result<Self, KeyError> {
        let body = s
            .strip_prefix(PUBLIC_KEY_PREFIX)
            .ok_or_else(|| KeyError::MalformedPublicKey(format!("missing {PUBLIC_KEY_PREFIX} prefix")))?;
        let payload = bs58::decode(body)
            .into_vec()
            .map_err(|e| KeyError::MalformedPublicKey(e.to_string()))?;
        if payload.len() != PUBLIC_KEY_BYTES + 4 {
            return Err(KeyError::MalformedPublicKey(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_BYTES + 4,
                payload.len()
            )));
        }
        let (point, checksum) = payload.split_at(PUBLIC_KEY_BYTES);
        let expected = Ripemd160::digest(point);
        if checksum != &expected[..4] {
            return Err(KeyError::MalformedPublicKey("checksum mismatch".into()));
        }
        k256::PublicKey::from_sec1_bytes(point)
            .map_err(|_| KeyError::MalformedPublicKey("not a curve point".into()))?;
        let mut bytes = [0u8; PUBLIC_KEY_BYTES];
        bytes.copy_from_slice(point);
        Ok(Self { bytes })
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_steem())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_steem())
    }
}

/// Derive the role-scoped private key for `(name, password, role)`.
///
/// Pure and deterministic: the same inputs always produce the same key.
pub fn derive_private_key(
    name: &str,
    password: &str,
    role: KeyRole,
) -> Result<PrivateKey, KeyError> {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(role.as_str().as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    let secret = SecretKey::from_slice(&digest).map_err(|_| KeyError::InvalidScalar)?;
    Ok(PrivateKey { secret })
}

/// Correspondence check between a derived private key and a published
/// chain-format public key. Injected into the verifier so tests can swap in
/// a fake.
pub trait KeyMatcher: Send + Sync {
    /// True when `private` is the counterpart of `published_key`.
    /// A `published_key` that does not parse never matches.
    fn keys_match(&self, private: &PrivateKey, published_key: &str) -> bool;
}

/// Production matcher: recompute the public key from the private scalar and
/// compare against the published point.
#[derive(Debug, Default, Clone, Copy)]
pub struct SteemKeyMatcher;

impl KeyMatcher for SteemKeyMatcher {
    fn keys_match(&self, private: &PrivateKey, published_key: &str) -> bool {
        match PublicKey::from_steem(published_key) {
            Ok(published) => private.public_key() == published,
            Err(_) => false,
        }
    }
}
