//! Fixed-window request limiter keyed by client address

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::domain::DomainError;
use crate::infrastructure::AppState;

const PRUNE_THRESHOLD: usize = 10_000;

pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: DashMap<String, (Instant, u32)>,
}

impl RateLimiter {
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limit > 0
    }

    /// Count one request for `key`. `Err` carries the seconds until the window resets.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        if !self.is_enabled() {
            return Ok(());
        }
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_owned()).or_insert((now, 0));
        let (started, count) = entry.value_mut();

        if now.duration_since(*started) >= self.window {
            *started = now;
            *count = 0;
        }
        if *count >= self.limit {
            let remaining = self.window.saturating_sub(now.duration_since(*started));
            return Err(remaining.as_secs().max(1));
        }
        *count += 1;
        Ok(())
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Forget windows that have fully elapsed
    pub fn prune(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, (started, _)| now.duration_since(*started) < self.window);
    }
}

/// Proxy headers first, then the socket peer
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }
    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return real_ip.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer);

    if state.rate_limiter.tracked_clients() > PRUNE_THRESHOLD {
        state.rate_limiter.prune();
    }

    match state.rate_limiter.check(&key) {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            tracing::warn!("Rate limit exceeded for {} on {}", key, req.uri().path());
            let mut response = DomainError::RateLimited(format!(
                "Rate limit exceeded. Try again in {} seconds",
                retry_after
            ))
            .into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}
