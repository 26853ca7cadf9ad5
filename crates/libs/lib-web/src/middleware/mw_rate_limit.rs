//! # Rate Limiting Middleware
//!
//! Fixed-window, per-client-IP rate limiting with two independent limiters:
//!
//! - **Global limiter**: counts every request that reaches the router and
//!   rejects the requester once the window cap is exceeded.
//! - **Auth limiter**: mounted only on `/api/auth` routes. It counts
//!   *failed* attempts (status >= 400 after the handler runs), so successful
//!   logins never consume budget. A client over the cap is rejected before
//!   the handler executes.
//!
//! Both limiters answer `429 Too Many Requests` with `RateLimit-*` headers
//! describing the window.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::server::AppState;

/// Entries above this count trigger a prune of expired windows on insert.
const PRUNE_THRESHOLD: usize = 10_000;

/// One client's window state.
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of consulting a limiter for one client.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

/// Fixed-window counter keyed by client IP.
///
/// Windows start on a client's first event and reset `window` later; there
/// is no sliding or token refill. State lives in-process, so counts reset
/// on restart and are per-instance.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    cap: u32,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration, cap: u32) -> Self {
        Self {
            window,
            cap,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Count one event for `ip` and report whether it is within the cap.
    ///
    /// The event is counted even when the decision is a rejection, so a
    /// client hammering the endpoint keeps its window alive.
    pub fn check(&self, ip: IpAddr) -> Decision {
        let now = Instant::now();
        let mut clients = self.clients.lock().expect("rate limiter mutex poisoned");
        Self::prune_if_large(&mut clients, self.window, now);

        let window = clients.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }
        window.count += 1;

        Decision {
            allowed: window.count <= self.cap,
            limit: self.cap,
            remaining: self.cap.saturating_sub(window.count),
            reset_after: self.window.saturating_sub(now.duration_since(window.started)),
        }
    }

    /// Report whether `ip` still has budget, without counting an event.
    ///
    /// Used by the auth limiter to reject before the handler runs; the
    /// event is only recorded afterwards via [`record_failure`] when the
    /// handler answered with an error status.
    ///
    /// [`record_failure`]: RateLimiter::record_failure
    pub fn peek(&self, ip: IpAddr) -> Decision {
        let now = Instant::now();
        let clients = self.clients.lock().expect("rate limiter mutex poisoned");

        let (count, started) = match clients.get(&ip) {
            Some(w) if now.duration_since(w.started) < self.window => (w.count, w.started),
            _ => (0, now),
        };

        Decision {
            allowed: count < self.cap,
            limit: self.cap,
            remaining: self.cap.saturating_sub(count),
            reset_after: self.window.saturating_sub(now.duration_since(started)),
        }
    }

    /// Count one failed attempt for `ip`.
    pub fn record_failure(&self, ip: IpAddr) {
        let now = Instant::now();
        let mut clients = self.clients.lock().expect("rate limiter mutex poisoned");
        Self::prune_if_large(&mut clients, self.window, now);

        let window = clients.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }
        window.count += 1;
    }

    fn prune_if_large(clients: &mut HashMap<IpAddr, Window>, window: Duration, now: Instant) {
        if clients.len() >= PRUNE_THRESHOLD {
            clients.retain(|_, w| now.duration_since(w.started) < window);
        }
    }
}

/// Resolve the client IP for rate-limiting purposes.
///
/// When `trust_proxy` is set, the first entry of `X-Forwarded-For` wins
/// (the address the outermost proxy saw). Otherwise the peer address from
/// the connection is used. Falls back to `0.0.0.0` when neither is
/// available, which collapses such requests into one shared bucket.
pub fn client_ip(req: &Request<Body>, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        if let Some(forwarded) = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
        {
            if let Some(first) = forwarded.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return ip;
                }
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Global limiter: counts every request, rejects past the cap.
pub async fn global_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&req, state.config.trust_proxy);
    let decision = state.global_limiter.check(ip);

    if !decision.allowed {
        warn!("[RATELIMIT] Global limit exceeded for {}", ip);
        return rate_limited_response(
            "Too many requests from this IP, please try again later.",
            &decision,
        );
    }

    next.run(req).await
}

/// Auth limiter: rejects clients that are over budget, then counts the
/// attempt only when the handler answered with an error status.
pub async fn auth_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&req, state.config.trust_proxy);
    let decision = state.auth_limiter.peek(ip);

    if !decision.allowed {
        warn!("[RATELIMIT] Auth limit exceeded for {}", ip);
        return rate_limited_response(
            "Too many authentication attempts, please try again later.",
            &decision,
        );
    }

    let response = next.run(req).await;

    if response.status().as_u16() >= 400 {
        debug!(
            "[RATELIMIT] Recording failed auth attempt for {} (status {})",
            ip,
            response.status()
        );
        state.auth_limiter.record_failure(ip);
    }

    response
}

fn rate_limited_response(message: &str, decision: &Decision) -> Response {
    let mut response = Response::builder()
        .status(StatusCode::TOO_MANY_REQUESTS)
        .body(Body::from(message.to_string()))
        .unwrap_or_default();

    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("ratelimit-limit"),
        header_num(decision.limit as u64),
    );
    headers.insert(
        HeaderName::from_static("ratelimit-remaining"),
        header_num(decision.remaining as u64),
    );
    headers.insert(
        HeaderName::from_static("ratelimit-reset"),
        header_num(decision.reset_after.as_secs()),
    );

    response
}

fn header_num(n: u64) -> HeaderValue {
    HeaderValue::from_str(&n.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn check_allows_up_to_cap_then_rejects() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        assert!(limiter.check(ip(1)).allowed);
        assert!(limiter.check(ip(1)).allowed);
        assert!(limiter.check(ip(1)).allowed);
        assert!(!limiter.check(ip(1)).allowed);
    }

    #[test]
    fn check_isolates_clients() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        assert!(limiter.check(ip(1)).allowed);
        assert!(!limiter.check(ip(1)).allowed);
        assert!(limiter.check(ip(2)).allowed);
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(Duration::from_millis(20), 1);
        assert!(limiter.check(ip(1)).allowed);
        assert!(!limiter.check(ip(1)).allowed);
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check(ip(1)).allowed);
    }

    #[test]
    fn peek_does_not_consume_budget() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        for _ in 0..10 {
            assert!(limiter.peek(ip(1)).allowed);
        }
        limiter.record_failure(ip(1));
        limiter.record_failure(ip(1));
        assert!(!limiter.peek(ip(1)).allowed);
    }

    #[test]
    fn peek_reports_remaining() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 5);
        assert_eq!(limiter.peek(ip(1)).remaining, 5);
        limiter.record_failure(ip(1));
        assert_eq!(limiter.peek(ip(1)).remaining, 4);
    }

    #[test]
    fn client_ip_prefers_forwarded_header_when_trusted() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req, true), "203.0.113.7".parse::<IpAddr>().unwrap());
        // Untrusted: header ignored, no connect info means fallback bucket.
        assert_eq!(client_ip(&req, false), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn client_ip_ignores_garbage_forwarded_header() {
        let req = Request::builder()
            .header("x-forwarded-for", "not-an-ip")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req, true), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
}
