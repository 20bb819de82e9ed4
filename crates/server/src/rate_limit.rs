use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared_types::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::auth::jwt::Claims;

/// Sliding window rate limit state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    inner: Arc<Mutex<RateLimitInner>>,
}

struct RateLimitInner {
    /// Map from client key -> list of request timestamps.
    requests: HashMap<String, Vec<Instant>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimitState {
    /// Create rate limiter allowing `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateLimitInner {
                requests: HashMap::new(),
                max_requests,
                window,
            })),
        }
    }

    /// Per-minute limiter sized from `RATE_LIMIT_PER_MINUTE` (default 300).
    pub fn from_env() -> Self {
        let per_minute = std::env::var("RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);
        Self::new(per_minute, Duration::from_secs(60))
    }

    /// Check if a request from `key` is allowed. Returns true if allowed.
    fn check(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let now = Instant::now();
        let window = inner.window;
        let max = inner.max_requests;

        let timestamps = inner.requests.entry(key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < window);

        if timestamps.len() as u32 >= max {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Client key: the session's provider, else the session subject, else
/// "anonymous". Unauthenticated provider headers never pick a bucket.
fn client_key(request: &Request) -> String {
    let Some(claims) = request.extensions().get::<Claims>() else {
        return "anonymous".to_string();
    };
    match claims.provider() {
        Some(p) => format!("provider:{}", p.provider_id),
        None => format!("user:{}", claims.sub),
    }
}

/// Axum middleware that enforces the sliding-window limit per client key.
/// Must run inside the auth middleware so session claims are visible.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);

    if !state.check(&key) {
        tracing::warn!(key = %key, "Rate limit exceeded");
        return AppError::rate_limited("Rate limit exceeded. Please try again later.").into_response();
    }

    next.run(request).await
}
