//! Credential verification and bearer tokens.
//!
//! Two pieces, consumed in sequence per login: the [`CredentialVerifier`]
//! decides whether a username/password pair is authentic for the on-chain
//! account, and the [`TokenIssuer`] mints/validates the stateless JWT that
//! proves it afterward.

pub mod token;
pub mod verifier;

pub use token::{Claims, TokenIssuer};
pub use verifier::{CredentialVerifier, VerifiedUser};
