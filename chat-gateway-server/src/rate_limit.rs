// ============================================================================
// Rate Limiter
// ============================================================================
//
// Fixed-window request counter keyed by client IP:
// - A client's window opens on its first request and lasts `window`
// - Requests past `max` inside the window are answered with 429
// - Standard `RateLimit-*` headers on every response (no legacy X- headers)
//
// State is in-process only; expired windows are swept once per window.
// ============================================================================

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chat_gateway_shared::ErrorBody;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

const TOO_MANY_REQUESTS: &str = "Too many requests, please try again later.";

#[derive(Debug, Clone, Copy)]
struct Window {
    hits: u32,
    reset_at: Instant,
}

/// Outcome of counting one request against a client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

pub struct RateLimiter {
    max: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request from `client` and decide whether it may proceed.
    pub async fn check(&self, client: &str) -> Decision {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: &str, now: Instant) -> Decision {
        let mut clients = self.clients.lock().await;
        let entry = clients.entry(client.to_string()).or_insert(Window {
            hits: 0,
            reset_at: now + self.window,
        });

        if entry.reset_at <= now {
            entry.hits = 0;
            entry.reset_at = now + self.window;
        }
        entry.hits = entry.hits.saturating_add(1);

        Decision {
            allowed: entry.hits <= self.max,
            limit: self.max,
            remaining: self.max.saturating_sub(entry.hits),
            reset_after: entry.reset_at.saturating_duration_since(now),
        }
    }

    /// Drop every window that has already expired.
    pub async fn prune(&self) {
        self.prune_at(Instant::now()).await
    }

    async fn prune_at(&self, now: Instant) {
        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, window| window.reset_at > now);
        let removed = before - clients.len();
        if removed > 0 {
            debug!("Pruned {} expired rate limit window(s)", removed);
        }
    }

    /// Sweep expired windows in the background, once per window length.
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.window);
            loop {
                ticker.tick().await;
                limiter.prune().await;
            }
        })
    }

    fn policy(&self) -> String {
        format!("{};w={}", self.max, self.window.as_secs())
    }
}

/// Peer IP of the connection. Forwarding headers are not trusted.
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn reset_seconds(reset_after: Duration) -> u64 {
    let secs = reset_after.as_secs();
    if reset_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Rate limiting middleware; runs before any route or static file handler.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    let decision = limiter.check(&client).await;
    let reset = reset_seconds(decision.reset_after);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!(client = %client, "Rate limit exceeded");
        let mut rejected = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorBody::new(TOO_MANY_REQUESTS)),
        )
            .into_response();
        rejected
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(reset));
        rejected
    };

    let headers = response.headers_mut();
    if let Ok(policy) = HeaderValue::from_str(&limiter.policy()) {
        headers.insert(RATELIMIT_POLICY, policy);
    }
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(reset));

    response
}
