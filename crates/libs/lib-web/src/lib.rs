//! # Web Library
//!
//! HTTP bootstrap: middleware chain, CORS gate, rate limiting, session layer,
//! authentication strategy, route groups, and graceful shutdown.

pub mod cors;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod strategy;

pub use server::{start_server, AppState, ServerConfig};
