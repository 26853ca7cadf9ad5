//! # Middleware
//!
//! Axum middleware for identity resolution, rate limiting, request
//! stamping, logging and security headers.
//!
//! ## Modules
//!
//! - **[`mw_auth`]**: identity resolution and auth/admin route guards
//! - **[`mw_rate_limit`]**: fixed-window global and auth rate limiters
//! - **[`mw_req_stamp`]**: request ID and timestamp stamping
//! - **[`mw_logging`]**: structured request/response logging
//! - **[`mw_security`]**: hardening headers on every response

// region:    --- Modules
pub mod mw_auth;
pub mod mw_logging;
pub mod mw_rate_limit;
pub mod mw_req_stamp;
pub mod mw_security;
// endregion: --- Modules

// region:    --- Re-exports
pub use mw_auth::{load_identity, require_admin, require_auth};
pub use mw_logging::log_requests;
pub use mw_rate_limit::{auth_rate_limit, global_rate_limit, RateLimiter};
pub use mw_req_stamp::{stamp_req, RequestStamp};
pub use mw_security::security_headers;
// endregion: --- Re-exports
