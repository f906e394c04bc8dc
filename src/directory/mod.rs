//! Account directory: the external trust boundary.
//!
//! An account's public authentication keys live on chain; this module defines
//! the read-only view the verifier consumes. The production lookup
//! (`SteemDirectory`) speaks the condenser JSON-RPC protocol; tests inject
//! fakes through the [`AccountDirectory`] trait.

pub mod steem;

use crate::error::AuthError;
use crate::keys::KeyRole;
use async_trait::async_trait;
use serde::Deserialize;

pub use steem::SteemDirectory;

/// A role-scoped authority: an ordered list of `(public key, weight)` pairs
/// plus the weight threshold an operation must reach.
#[derive(Debug, Clone, Deserialize)]
pub struct Authority {
    pub weight_threshold: u32,
    /// Delegated account authorities. Parsed for completeness; key matching
    /// only consults `key_auths`.
    #[serde(default)]
    pub account_auths: Vec<(String, u16)>,
    /// Chain-format public keys in listed order.
    #[serde(default)]
    pub key_auths: Vec<(String, u16)>,
}

/// An on-chain account record, reduced to the authentication surface.
/// Read-only from this system's perspective.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub name: String,
    pub owner: Authority,
    pub active: Authority,
    pub posting: Authority,
    pub memo_key: String,
}

impl Account {
    /// The authority for a role, or `None` for the memo role (a bare key,
    /// not an authority set).
    pub fn authority(&self, role: KeyRole) -> Option<&Authority> {
        match role {
            KeyRole::Owner => Some(&self.owner),
            KeyRole::Active => Some(&self.active),
            KeyRole::Posting => Some(&self.posting),
            KeyRole::Memo => None,
        }
    }
}

/// Lookup capability for on-chain accounts.
///
/// `Ok(None)` means the directory answered and has no such account;
/// `Err(UpstreamUnavailable)` means the directory could not answer at all.
/// The two must stay distinct internally even though the HTTP boundary
/// collapses them.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn get_account(&self, username: &str) -> Result<Option<Account>, AuthError>;
}
