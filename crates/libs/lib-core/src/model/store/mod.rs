//! # Database Store
//!
//! Postgres connection pool and repository implementations.

// region: --- Modules
pub mod catalog_repository;
pub mod favorite_repository;
pub mod models;
pub mod reservation_repository;
pub mod session_store;
pub mod settings_repository;
pub mod user_repository;
// endregion: --- Modules

// region: --- Re-exports
pub use catalog_repository::CatalogRepository;
pub use favorite_repository::FavoriteRepository;
pub use reservation_repository::ReservationRepository;
pub use session_store::PostgresSessionStore;
pub use settings_repository::SettingsRepository;
pub use user_repository::UserRepository;
// endregion: --- Re-exports

// region: --- Types and Functions
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::Config;

/// Type alias for the Postgres connection pool.
pub type DbPool = PgPool;

/// Pool bounds: one pool per process, shared by every route group.
const MAX_CONNECTIONS: u32 = 20;
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// Create the Postgres connection pool.
///
/// Connections are established lazily; startup reachability is checked
/// separately by [`probe_pool`] so an unreachable database does not abort
/// the boot sequence.
pub fn create_pool(config: &Config) -> anyhow::Result<DbPool> {
    let options = config
        .database_url
        .parse::<PgConnectOptions>()?
        // TLS when the server offers it, without certificate validation.
        .ssl_mode(PgSslMode::Prefer);

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .idle_timeout(IDLE_TIMEOUT)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_lazy_with(options);

    Ok(pool)
}

/// Acquire-and-release one connection to confirm reachability.
///
/// Logs the outcome; never fails startup.
pub async fn probe_pool(pool: &DbPool) {
    match pool.acquire().await {
        Ok(_conn) => info!("[DB] Connection probe succeeded"),
        Err(e) => warn!("[DB] Connection probe failed, continuing startup: {}", e),
    }
}
// endregion: --- Types and Functions
