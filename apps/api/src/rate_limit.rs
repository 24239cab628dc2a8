//! Rate limiting for the AI endpoints.
//!
//! `AppState` holds an `Arc<dyn RateLimiter>`. The default backend is an in-memory fixed
//! window, suitable for a single instance; counts reset when the process restarts.
//! A multi-instance deployment swaps in a shared-store implementation of the same trait.
//!
//! Clients are keyed by TCP peer address. `X-Forwarded-For` / `X-Real-IP` are only
//! honoured with `TRUST_PROXY_HEADERS=true`, which is safe only behind a proxy that
//! overwrites them; otherwise a client could rotate the header to dodge the limit.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// Sweep expired windows once the table grows past this many keys,
/// at most once per window length.
const PRUNE_THRESHOLD: usize = 10_000;

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Records one request for `key` and reports whether it may proceed.
    async fn allow(&self, key: &str) -> bool;

    /// Length of the limiting window, used for `Retry-After`.
    fn window(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Table {
    windows: HashMap<String, Window>,
    last_prune: Instant,
}

/// Fixed window counter keyed by client address.
pub struct FixedWindowLimiter {
    window: Duration,
    capacity: u32,
    table: Mutex<Table>,
}

impl FixedWindowLimiter {
    pub fn new(window: Duration, capacity: u32) -> Self {
        Self {
            window,
            capacity,
            table: Mutex::new(Table {
                windows: HashMap::new(),
                last_prune: Instant::now(),
            }),
        }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut table = self.table.lock().await;

        if table.windows.len() >= PRUNE_THRESHOLD
            && now.duration_since(table.last_prune) >= self.window
        {
            let window = self.window;
            table
                .windows
                .retain(|_, w| now.duration_since(w.started) < window);
            table.last_prune = now;
        }

        let entry = table.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.capacity {
            return false;
        }
        entry.count += 1;
        true
    }

    fn window(&self) -> Duration {
        self.window
    }
}

/// Resolves the client key. Proxy headers win only when `trust_proxy_headers` is set;
/// otherwise the TCP peer is used.
pub fn client_key(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    let peer = peer.map(|addr| addr.ip().to_string());
    if !trust_proxy_headers {
        return peer.unwrap_or_else(|| "unknown".to_string());
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or(peer)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Axum middleware guarding the AI endpoints.
pub async fn enforce(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(
        request.headers(),
        connect_info.map(|ConnectInfo(addr)| addr),
        state.config.trust_proxy_headers,
    );

    if !state.rate_limiter.allow(&key).await {
        warn!("Rate limit exceeded for client {key} on {}", request.uri().path());
        return Err(AppError::RateLimited {
            retry_after_secs: state.rate_limiter.window().as_secs().max(1),
        });
    }

    Ok(next.run(request).await)
}
