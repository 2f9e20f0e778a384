// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Middleware module for HTTP request processing
//!
//! Per-IP rate limiting for the `/v1` routes and the switch that turns the
//! direct import routes off.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::{config::RateLimitingConfig, error::ServerError, state::ServerState};

const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Fixed-window request counter per client IP
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitingConfig,
    windows: Arc<DashMap<IpAddr, Window>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    requests: u32,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitingConfig) -> Self {
        Self {
            config,
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Count a request from `ip` and report whether it exceeds the limit
    pub fn is_rate_limited(&self, ip: IpAddr) -> bool {
        if !self.config.enabled {
            return false;
        }

        let now = Instant::now();
        if self.windows.len() > MAX_TRACKED_CLIENTS {
            self.evict(now);
        }

        let requests = {
            let mut window = self.windows.entry(ip).or_insert(Window {
                started: now,
                requests: 0,
            });
            if now.duration_since(window.started) > RATE_LIMIT_WINDOW {
                *window = Window {
                    started: now,
                    requests: 0,
                };
            }
            window.requests += 1;
            window.requests
        };

        let limited = requests > self.config.requests_per_minute;
        if limited {
            debug!(%ip, requests, "request over the limit");
        }
        limited
    }

    fn evict(&self, now: Instant) {
        self.windows
            .retain(|_, window| now.duration_since(window.started) <= RATE_LIMIT_WINDOW);

        let remaining = self.windows.len();
        if remaining <= MAX_TRACKED_CLIENTS {
            return;
        }

        warn!(remaining, "too many active clients, dropping the oldest windows");
        let mut by_age: Vec<_> = self
            .windows
            .iter()
            .map(|entry| (*entry.key(), entry.value().started))
            .collect();
        by_age.sort_by_key(|(_, started)| *started);

        for (ip, _) in by_age.into_iter().take(remaining - MAX_TRACKED_CLIENTS / 2) {
            self.windows.remove(&ip);
        }
    }
}

/// Answer `429 Too Many Requests` for clients over their limit
pub async fn rate_limiting_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(rate_limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let client_ip = addr.ip();

    if rate_limiter.is_rate_limited(client_ip) {
        warn!(%client_ip, "rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(req).await)
}

/// Reject `/v1/direct` requests when direct import is switched off
pub async fn direct_import_gate(
    State(state): State<ServerState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.config().direct_import.enabled {
        debug!(path = req.uri().path(), "direct import is disabled");
        return ServerError::Forbidden("direct import is disabled".to_string()).into_response();
    }

    next.run(req).await
}
