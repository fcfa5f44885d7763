//! Per-IP protection for the `/admin/` surface: a fixed-window request limit
//! and a lockout after repeated failed logins.

use crate::config::SecurityConfig;
use crate::state::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const RATE_LIMITED_MESSAGE: &str = "Demasiadas solicitudes. Intenta de nuevo más tarde.";
pub const LOGIN_BLOCKED_MESSAGE: &str = "Acceso bloqueado por intentos fallidos.";

const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    RateLimited,
    LoginBlocked,
}

#[derive(Debug)]
struct ClientEntry {
    window_start: Instant,
    requests: u32,
    failed_logins: u32,
    blocked_until: Option<Instant>,
}

impl ClientEntry {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            requests: 0,
            failed_logins: 0,
            blocked_until: None,
        }
    }

    fn is_blocked(&mut self, now: Instant) -> bool {
        match self.blocked_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.blocked_until = None;
                self.failed_logins = 0;
                false
            }
            None => false,
        }
    }
}

/// Both counters for a client live in one entry behind one lock, so every
/// check-and-increment is atomic.
pub struct SecurityGuard {
    config: SecurityConfig,
    clients: Mutex<HashMap<String, ClientEntry>>,
}

impl SecurityGuard {
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.rate_window_secs)
    }

    pub async fn check(&self, ip: &str, is_login: bool) -> Verdict {
        self.check_at(ip, is_login, Instant::now()).await
    }

    async fn check_at(&self, ip: &str, is_login: bool, now: Instant) -> Verdict {
        let window = self.window();
        let mut clients = self.clients.lock().await;

        if clients.len() > PRUNE_THRESHOLD {
            clients.retain(|_, entry| {
                now.duration_since(entry.window_start) < window || entry.blocked_until.is_some()
            });
        }

        let entry = clients
            .entry(ip.to_string())
            .or_insert_with(|| ClientEntry::new(now));

        if now.duration_since(entry.window_start) >= window {
            entry.window_start = now;
            entry.requests = 0;
        }
        if entry.requests >= self.config.rate_limit {
            return Verdict::RateLimited;
        }
        entry.requests += 1;

        if is_login && entry.is_blocked(now) {
            return Verdict::LoginBlocked;
        }
        Verdict::Allowed
    }

    /// Counts a failed login and returns the running total.
    pub async fn record_login_failure(&self, ip: &str) -> u32 {
        self.record_login_failure_at(ip, Instant::now()).await
    }

    async fn record_login_failure_at(&self, ip: &str, now: Instant) -> u32 {
        let mut clients = self.clients.lock().await;
        let entry = clients
            .entry(ip.to_string())
            .or_insert_with(|| ClientEntry::new(now));
        entry.failed_logins += 1;
        if entry.failed_logins >= self.config.max_login_attempts && entry.blocked_until.is_none() {
            entry.blocked_until = Some(now + Duration::from_secs(self.config.login_block_secs));
            warn!(
                "AUDIT: LOGIN_BLOCKED - IP: {}, attempts: {}",
                ip, entry.failed_logins
            );
        }
        entry.failed_logins
    }

    pub async fn record_login_success(&self, ip: &str) {
        let mut clients = self.clients.lock().await;
        if let Some(entry) = clients.get_mut(ip) {
            entry.failed_logins = 0;
            entry.blocked_until = None;
        }
    }
}

/// The socket peer, or the first `X-Forwarded-For` hop when `trust_forwarded`
/// is set.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> String {
    let forwarded = if trust_forwarded {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
    } else {
        None
    };
    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn request_ip(request: &Request, trust_forwarded: bool) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_ip(request.headers(), peer, trust_forwarded)
}

/// Middleware for everything under `/admin/`.
pub async fn admin_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let ip = request_ip(&request, state.config.security.trust_forwarded_for);
    let is_login = request.uri().path().starts_with("/admin/login");

    match state.security.check(&ip, is_login).await {
        Verdict::Allowed => next.run(request).await,
        Verdict::RateLimited => {
            warn!("AUDIT: RATE_LIMITED - IP: {}, path: {}", ip, request.uri().path());
            (StatusCode::FORBIDDEN, RATE_LIMITED_MESSAGE).into_response()
        }
        Verdict::LoginBlocked => {
            info!("AUDIT: LOGIN_REJECTED_WHILE_BLOCKED - IP: {}", ip);
            (StatusCode::FORBIDDEN, LOGIN_BLOCKED_MESSAGE).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn guard(rate_limit: u32, max_login_attempts: u32) -> SecurityGuard {
        SecurityGuard::new(SecurityConfig {
            rate_limit,
            rate_window_secs: 60,
            max_login_attempts,
            login_block_secs: 300,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn window_caps_requests_then_resets() {
        let guard = guard(3, 5);
        let start = Instant::now();
        for _ in 0..3 {
            assert_eq!(guard.check_at("10.0.0.1", false, start).await, Verdict::Allowed);
        }
        assert_eq!(guard.check_at("10.0.0.1", false, start).await, Verdict::RateLimited);
        assert_eq!(guard.check_at("10.0.0.2", false, start).await, Verdict::Allowed);

        let later = start + Duration::from_secs(61);
        assert_eq!(guard.check_at("10.0.0.1", false, later).await, Verdict::Allowed);
    }

    #[tokio::test]
    async fn repeated_failures_block_login_until_expiry() {
        let guard = guard(100, 5);
        let start = Instant::now();
        for attempt in 1..=5 {
            assert_eq!(guard.record_login_failure_at("10.0.0.9", start).await, attempt);
        }
        assert_eq!(guard.check_at("10.0.0.9", true, start).await, Verdict::LoginBlocked);
        // Other admin paths are only rate limited
        assert_eq!(guard.check_at("10.0.0.9", false, start).await, Verdict::Allowed);

        let after_block = start + Duration::from_secs(301);
        assert_eq!(guard.check_at("10.0.0.9", true, after_block).await, Verdict::Allowed);
    }

    #[tokio::test]
    async fn success_clears_failures() {
        let guard = guard(100, 2);
        guard.record_login_failure("10.0.0.3").await;
        guard.record_login_success("10.0.0.3").await;
        assert_eq!(guard.record_login_failure("10.0.0.3").await, 1);
        assert_eq!(guard.check("10.0.0.3", true).await, Verdict::Allowed);
    }

    #[test]
    fn forwarded_for_is_ignored_unless_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer), false), "127.0.0.1");
        assert_eq!(client_ip(&headers, Some(peer), true), "203.0.113.7");
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer), true), "127.0.0.1");
        assert_eq!(client_ip(&HeaderMap::new(), None, false), "unknown");
    }
}
