//! Condenser JSON-RPC client for account lookups.
//!
//! One method is consumed: `condenser_api.get_accounts`, which answers with a
//! (possibly empty) array of account records. Transport failures, non-2xx
//! statuses, RPC error envelopes, and unparseable bodies all surface as
//! `UpstreamUnavailable`; an empty result array is a clean "no such account".

use super::{Account, AccountDirectory};
use crate::error::AuthError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// JSON-RPC reply envelope.
#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Vec<Account>>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// HTTP client against a condenser-compatible RPC endpoint.
pub struct SteemDirectory {
    endpoint: String,
    http: reqwest::Client,
}

impl SteemDirectory {
    /// Create a client for the given endpoint with an explicit timeout.
    ///
    /// The timeout is the only thing standing between a dead upstream and a
    /// hung login request; it is not optional.
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl AccountDirectory for SteemDirectory {
    async fn get_account(&self, username: &str) -> Result<Option<Account>, AuthError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "condenser_api.get_accounts",
            "params": [[username]],
            "id": 1,
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "account directory request failed");
                AuthError::upstream(e.to_string())
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::warn!(%status, "account directory answered non-success");
            return Err(AuthError::upstream(format!("status {status}")));
        }

        let reply: RpcReply = resp.json().await.map_err(|e| {
            tracing::warn!(error = %e, "account directory answered unparseable body");
            AuthError::upstream(e.to_string())
        })?;

        if let Some(err) = reply.error {
            tracing::warn!(code = err.code, message = %err.message, "account directory RPC error");
            return Err(AuthError::upstream(err.message));
        }

        Ok(reply
            .result
            .and_then(|mut accounts| (!accounts.is_empty()).then(|| accounts.remove(0))))
    }
}
