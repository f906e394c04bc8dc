//! steemgate: a stateless authentication relay for Steem accounts.
//!
//! The relay verifies a username/password pair by deriving the account's
//! role-scoped private key and checking it against the public posting key
//! published on chain, then mints a signed, time-bound bearer token (JWT).
//! Subsequent requests present the token; the relay validates it and returns
//! the embedded claims. No session state is held between requests.

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod keys;

pub use auth::{Claims, CredentialVerifier, TokenIssuer};
pub use config::Config;
pub use error::AuthError;
