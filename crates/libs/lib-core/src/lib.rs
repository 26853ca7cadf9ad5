//! # Core Library
//!
//! Configuration, error handling, database pool, and repositories.

pub mod config;
pub mod error;
pub mod model;

// Re-export commonly used types
pub use config::{AuthMode, Config, Environment, SameSitePolicy};
pub use error::{AppError, Result};
pub use model::store::{create_pool, probe_pool, DbPool};
