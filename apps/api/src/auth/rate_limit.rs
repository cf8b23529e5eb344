//! Fixed-window request counter keyed by route and client address.
//!
//! Lives in process memory, so limits are per instance and reset on restart.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use tracing::warn;

use crate::config::Config;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    trust_forwarded_for: bool,
    buckets: DashMap<(String, IpAddr), Window>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            trust_forwarded_for: false,
            buckets: DashMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut limiter = Self::new(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
        );
        limiter.trust_forwarded_for = config.trust_forwarded_for;
        limiter
    }

    /// Address a request is counted against. The forwarded header is
    /// client-controlled unless a proxy rewrites it, so it is opt-in.
    fn client_ip(&self, request: &Request, peer: IpAddr) -> IpAddr {
        if self.trust_forwarded_for {
            forwarded_for(request).unwrap_or(peer)
        } else {
            peer
        }
    }

    /// Counts one request. Returns the seconds until the window resets when over the limit.
    pub fn check(&self, route: &str, ip: IpAddr) -> Result<(), u64> {
        self.check_at(route, ip, Instant::now())
    }

    fn check_at(&self, route: &str, ip: IpAddr, now: Instant) -> Result<(), u64> {
        let mut entry = self
            .buckets
            .entry((route.to_string(), ip))
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.started);
            let remaining = self.window.saturating_sub(elapsed);
            // Round up so clients never retry a hair too early.
            return Err(remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0));
        }

        entry.count += 1;
        Ok(())
    }

    /// Drops windows that have already expired.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.buckets
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }
}

/// Axum middleware guarding credential endpoints.
pub async fn rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let ip = state.rate_limiter.client_ip(&request, addr.ip());

    if let Err(retry_after_secs) = state.rate_limiter.check(&route, ip) {
        warn!("Rate limit exceeded for {ip} on {route}");
        return Err(AppError::TooManyRequests { retry_after_secs });
    }

    Ok(next.run(request).await)
}

/// First hop of `X-Forwarded-For`, when running behind a proxy.
fn forwarded_for(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at("/login", ip(1), now).is_ok());
        }
        let retry = limiter.check_at("/login", ip(1), now).unwrap_err();
        assert_eq!(retry, 60);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("/login", ip(1), now).is_ok());
        assert!(limiter.check_at("/login", ip(2), now).is_ok());
        assert!(limiter.check_at("/register", ip(1), now).is_ok());
        assert!(limiter.check_at("/login", ip(1), now).is_err());
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();
        assert!(limiter.check_at("/login", ip(1), start).is_ok());
        let retry = limiter
            .check_at("/login", ip(1), start + Duration::from_millis(4500))
            .unwrap_err();
        assert_eq!(retry, 6);
        assert!(limiter
            .check_at("/login", ip(1), start + Duration::from_secs(10))
            .is_ok());
    }

    #[test]
    fn test_purge_drops_stale_windows() {
        let limiter = RateLimiter::new(5, Duration::from_millis(0));
        limiter.check("/login", ip(3)).unwrap();
        limiter.purge_expired();
        assert_eq!(limiter.tracked_keys(), 0);
    }

    fn forwarded_request() -> Request {
        Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap()
    }

    #[test]
    fn test_forwarded_for_parsing() {
        assert_eq!(
            forwarded_for(&forwarded_request()),
            Some("203.0.113.7".parse().unwrap())
        );
    }

    #[test]
    fn test_forwarded_for_ignored_by_default() {
        let limiter = RateLimiter::from_config(&Config::for_tests());
        assert_eq!(limiter.client_ip(&forwarded_request(), ip(9)), ip(9));
    }

    #[test]
    fn test_forwarded_for_used_when_trusted() {
        let config = Config {
            trust_forwarded_for: true,
            ..Config::for_tests()
        };
        let limiter = RateLimiter::from_config(&config);
        assert_eq!(
            limiter.client_ip(&forwarded_request(), ip(9)),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_from_config_limits() {
        let limiter = RateLimiter::from_config(&Config::for_tests());
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at("/register", ip(4), now).is_ok());
        }
        assert_eq!(limiter.check_at("/register", ip(4), now), Err(60));
    }
}
