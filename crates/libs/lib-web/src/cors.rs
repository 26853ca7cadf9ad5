//! CORS gate.
//!
//! Decisions happen before any route logic runs: requests without an `Origin`
//! header pass through untouched (non-browser clients), exact allow-list
//! matches and pattern matches get CORS headers, everything else gets none and
//! the browser blocks the response client-side. Preflight `OPTIONS` requests
//! are answered directly by the layer.

use axum::http::{header, request::Parts, HeaderValue, Method};
use regex::Regex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};

use lib_core::Config;

/// Build the CORS layer from the resolved configuration.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let allowlist = config.allowed_origins.clone();
    let patterns = config.cors_patterns.clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                let Ok(origin) = origin.to_str() else {
                    warn!("[CORS] Denied origin with non-ASCII value");
                    return false;
                };

                let allowed = origin_allowed(origin, &allowlist, &patterns);
                if allowed {
                    debug!(origin = %origin, "[CORS] Origin allowed");
                } else {
                    warn!(origin = %origin, "[CORS] Origin denied");
                }
                allowed
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        // Session cookies ride on cross-origin requests.
        .allow_credentials(true)
}

/// Exact allow-list match first, then the compiled patterns.
pub fn origin_allowed(origin: &str, allowlist: &[String], patterns: &[Regex]) -> bool {
    if allowlist.iter().any(|allowed| allowed == origin) {
        return true;
    }

    patterns.iter().any(|pattern| pattern.is_match(origin))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowlist() -> Vec<String> {
        vec![
            "http://localhost:3000".to_string(),
            "https://app.example.com".to_string(),
        ]
    }

    fn patterns() -> Vec<Regex> {
        vec![
            Regex::new(r"^https?://(localhost|127\.0\.0\.1)(:\d+)?$").unwrap(),
            Regex::new(r"^https://[a-z0-9-]+\.vercel\.app$").unwrap(),
        ]
    }

    #[test]
    fn test_exact_match_allowed() {
        assert!(origin_allowed("https://app.example.com", &allowlist(), &patterns()));
    }

    #[test]
    fn test_any_localhost_port_allowed() {
        assert!(origin_allowed("http://localhost:5173", &allowlist(), &patterns()));
        assert!(origin_allowed("http://127.0.0.1:8080", &allowlist(), &patterns()));
    }

    #[test]
    fn test_preview_subdomain_allowed() {
        assert!(origin_allowed("https://my-branch-abc123.vercel.app", &allowlist(), &patterns()));
    }

    #[test]
    fn test_unknown_origin_denied() {
        assert!(!origin_allowed("https://evil.example.net", &allowlist(), &patterns()));
        // Pattern must anchor: a lookalike suffix is not a subdomain.
        assert!(!origin_allowed("https://foo.vercel.app.evil.net", &allowlist(), &patterns()));
    }
}
