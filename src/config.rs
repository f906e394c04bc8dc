//! Process configuration: TOML file with environment overrides.
//!
//! Precedence is environment > file > default, and the signing secret is the
//! one setting with no default; the process refuses to start without it.
//! Hard-coding a signing secret is exactly the defect this layer exists to
//! prevent.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Env var carrying the token signing secret.
pub const ENV_TOKEN_SECRET: &str = "STEEMGATE_TOKEN_SECRET";
/// Env var overriding the account directory endpoint.
pub const ENV_UPSTREAM_URL: &str = "STEEMGATE_UPSTREAM_URL";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_login_rate_limit() -> u32 {
    30
}

fn default_upstream_url() -> String {
    "https://api.steemit.com".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_token_ttl_secs() -> u64 {
    3600
}

/// Gateway bind + rate limit settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login attempts allowed per client per minute. `0` disables limiting.
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit_per_minute: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            login_rate_limit_per_minute: default_login_rate_limit(),
        }
    }
}

/// Account directory (condenser RPC) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    /// Hard timeout on directory lookups; a dead upstream must surface as a
    /// rejection, not a hang.
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

/// Token signing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Signing secret. Required; supplied via config file or
    /// `STEEMGATE_TOKEN_SECRET`.
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_secs: default_token_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub token: TokenConfig,
}

impl Config {
    /// Load configuration: optional TOML file, then env overrides, then
    /// validation. Fails when the signing secret is missing or a setting is
    /// out of range.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config file {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", p.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup closure (injectable for
    /// tests). Empty values are treated as unset.
    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(secret) = env(ENV_TOKEN_SECRET) {
            let secret = secret.trim().to_string();
            if !secret.is_empty() {
                self.token.secret = secret;
            }
        }
        if let Some(url) = env(ENV_UPSTREAM_URL) {
            let url = url.trim().to_string();
            if !url.is_empty() {
                self.upstream.url = url;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.token.secret.trim().is_empty() {
            bail!(
                "No token signing secret configured. Set {ENV_TOKEN_SECRET} or \
                 [token] secret in the config file; refusing to start with \
                 a default secret."
            );
        }
        if self.token.ttl_secs == 0 {
            bail!("[token] ttl_secs must be positive");
        }
        if self.upstream.timeout_secs == 0 {
            bail!("[upstream] timeout_secs must be positive");
        }
        if self.upstream.url.trim().is_empty() {
            bail!("[upstream] url must not be empty");
        }
        Ok(())
    }
}
