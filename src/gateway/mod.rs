//! Axum-based HTTP gateway: the login and authenticated-request surface.
//!
//! Hardening follows the usual hyper/axum stack: body size limits, request
//! timeouts, CORS, and a sliding-window rate limit on login attempts.
//!
//! Security property carried through every handler: the three login failure
//! modes (unknown account, unreachable directory, wrong password) and the
//! three token failure modes (malformed, expired, bad signature) are each
//! logged distinctly but answered identically, so the HTTP surface is not an
//! account-enumeration oracle.

use crate::auth::{CredentialVerifier, TokenIssuer};
use crate::config::Config;
use crate::directory::SteemDirectory;
use crate::keys::{KeyRole, SteemKeyMatcher};
use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (16KB); login bodies are tiny.
pub const MAX_BODY_SIZE: usize = 16_384;
/// Request timeout (30s); the upstream lookup has its own shorter timeout.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Sliding window used by login rate limiting.
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// How often the rate limiter sweeps stale client entries from its map.
const RATE_LIMITER_SWEEP_INTERVAL_SECS: u64 = 300; // 5 minutes

#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    limit_per_window: u32,
    window: Duration,
    requests: Mutex<(HashMap<String, Vec<Instant>>, Instant)>,
}

impl SlidingWindowRateLimiter {
    pub fn new(limit_per_window: u32, window: Duration) -> Self {
        Self {
            limit_per_window,
            window,
            requests: Mutex::new((HashMap::new(), Instant::now())),
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        if self.limit_per_window == 0 {
            return true;
        }

        let now = Instant::now();
        let cutoff = now.checked_sub(self.window).unwrap_or_else(Instant::now);

        let mut guard = self.requests.lock();
        let (requests, last_sweep) = &mut *guard;

        // Periodic sweep: remove clients with no recent attempts
        if last_sweep.elapsed() >= Duration::from_secs(RATE_LIMITER_SWEEP_INTERVAL_SECS) {
            requests.retain(|_, timestamps| {
                timestamps.retain(|t| *t > cutoff);
                !timestamps.is_empty()
            });
            *last_sweep = now;
        }

        let entry = requests.entry(key.to_owned()).or_default();
        entry.retain(|instant| *instant > cutoff);

        if entry.len() >= self.limit_per_window as usize {
            return false;
        }

        entry.push(now);
        true
    }
}

fn client_key_from_headers(headers: &HeaderMap) -> String {
    for header_name in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(value) = headers.get(header_name).and_then(|v| v.to_str().ok()) {
            let first = value.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                return first.to_owned();
            }
        }
    }
    "unknown".into()
}

/// The bearer token from an `Authorization: Bearer <token>` header, if the
/// header is present and well-formed.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Shared state for all axum handlers. Everything is read-only after
/// startup except the limiter's interior map, so requests are served
/// concurrently with no further locking.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<CredentialVerifier>,
    pub issuer: Arc<TokenIssuer>,
    pub login_limiter: Arc<SlidingWindowRateLimiter>,
}

/// Build the gateway router over prepared state. Split out from
/// [`run_gateway`] so tests can serve it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/login", post(handle_login))
        .route("/api/posts", post(handle_posts))
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
}

/// Assemble state from configuration: condenser directory, production key
/// matcher, verifier over the posting role, and the token issuer.
pub fn build_state(config: &Config) -> Result<AppState> {
    let directory = SteemDirectory::new(
        &config.upstream.url,
        Duration::from_secs(config.upstream.timeout_secs),
    )?;
    let verifier = CredentialVerifier::new(
        Arc::new(directory),
        Arc::new(SteemKeyMatcher),
        KeyRole::Posting,
    );
    let issuer = TokenIssuer::new(
        &config.token.secret,
        Duration::from_secs(config.token.ttl_secs),
    );
    Ok(AppState {
        verifier: Arc::new(verifier),
        issuer: Arc::new(issuer),
        login_limiter: Arc::new(SlidingWindowRateLimiter::new(
            config.gateway.login_rate_limit_per_minute,
            Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
        )),
    })
}

/// Run the HTTP gateway until Ctrl+C.
pub async fn run_gateway(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let display_addr = listener.local_addr()?;

    let state = build_state(&config)?;
    let app = router(state);

    tracing::info!(upstream = %config.upstream.url, "gateway starting");
    println!("🔐 steemgate listening on http://{display_addr}");
    println!("  POST /api/login   {{\"username\", \"password\"}} -> {{\"token\"}}");
    println!("  POST /api/posts   Authorization: Bearer <token>");
    println!("  GET  /health      health check");
    println!("  Press Ctrl+C to stop.\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /health, always public (no secrets leaked)
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Login request body. Missing fields deserialize to empty strings, which
/// reject deterministically downstream.
#[derive(Debug, Default, Deserialize)]
struct LoginBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// POST /api/login: exchange username/password for a bearer token.
///
/// Every failure mode answers 403 with an empty body. A malformed or absent
/// JSON body is folded into the same path: empty credentials, deterministic
/// reject.
async fn handle_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginBody>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let client_key = client_key_from_headers(&headers);
    if !state.login_limiter.allow(&client_key) {
        tracing::warn!(client = %client_key, "login rate limit exceeded");
        let err = serde_json::json!({
            "error": "Too many login attempts. Please retry later.",
            "retry_after": RATE_LIMIT_WINDOW_SECS,
        });
        return (StatusCode::TOO_MANY_REQUESTS, Json(err)).into_response();
    }

    let body = body.map(|Json(b)| b).unwrap_or_default();

    match state.verifier.verify(&body.username, &body.password).await {
        Ok(user) => match state.issuer.issue(&user.username) {
            Ok(token) => {
                tracing::info!(username = %user.username, "login succeeded");
                (StatusCode::OK, Json(serde_json::json!({ "token": token }))).into_response()
            }
            Err(e) => {
                tracing::error!(error = %e, "token issuance failed");
                StatusCode::FORBIDDEN.into_response()
            }
        },
        Err(e) => {
            // Distinct internally for observability; uniform externally.
            tracing::warn!(username = %body.username.trim(), error = %e, "login rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST /api/posts: example authenticated endpoint.
///
/// Validates the presented bearer token and echoes the decoded claims.
/// Absent, malformed, expired, and forged tokens all answer 403.
async fn handle_posts(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        tracing::warn!("authenticated request without a usable bearer token");
        return StatusCode::FORBIDDEN.into_response();
    };

    match state.issuer.validate(token) {
        Ok(claims) => {
            (StatusCode::OK, Json(serde_json::json!({ "auth": claims }))).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "token rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn rate_limiter_allows_up_to_the_limit() {
        let limiter = SlidingWindowRateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(!limiter.allow("1.2.3.4"));
    }

    #[test]
    fn rate_limiter_tracks_clients_independently() {
        let limiter = SlidingWindowRateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("5.6.7.8"));
        assert!(!limiter.allow("1.2.3.4"));
    }

    #[test]
    fn rate_limiter_zero_means_unlimited() {
        let limiter = SlidingWindowRateLimiter::new(0, Duration::from_secs(60));
        for _ in 0..100 {
            assert!(limiter.allow("1.2.3.4"));
        }
    }

    #[test]
    fn rate_limiter_window_expiry_frees_the_slot() {
        let limiter = SlidingWindowRateLimiter::new(1, Duration::from_millis(50));
        assert!(limiter.allow("1.2.3.4"));
        assert!(!limiter.allow("1.2.3.4"));
        std::thread::sleep(Duration::from_millis(80));
        assert!(limiter.allow("1.2.3.4"));
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Forwarded-For",
            HeaderValue::from_static("9.9.9.9, 10.0.0.1"),
        );
        assert_eq!(client_key_from_headers(&headers), "9.9.9.9");

        let mut headers = HeaderMap::new();
        headers.insert("X-Real-IP", HeaderValue::from_static("8.8.8.8"));
        assert_eq!(client_key_from_headers(&headers), "8.8.8.8");

        assert_eq!(client_key_from_headers(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_rejects_malformed_headers() {
        for value in ["abc.def.ghi", "Token abc", "Bearer", "Bearer "] {
            let mut headers = HeaderMap::new();
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
            assert_eq!(bearer_token(&headers), None, "value: {value:?}");
        }
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
