//! Session layer (cookie-session auth mode only).
//!
//! Signed cookie, server-side record in Postgres, rolling 24-hour inactivity
//! expiry. Cookie flags follow the environment: secure + SameSite=None in
//! production (cross-origin frontend), SameSite=Lax in development.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use tower_sessions::{
    cookie::{time::Duration, Key, SameSite},
    service::SignedCookie,
    Expiry, SessionManagerLayer,
};
use tracing::{debug, warn};

use lib_core::model::store::PostgresSessionStore;
use lib_core::{Config, SameSitePolicy};

use crate::shutdown::Shutdown;

/// Session cookie name.
const SESSION_COOKIE: &str = "restaurant.sid";

/// How often the expired-session sweep runs.
const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(10 * 60);

/// Build the session layer for the cookie-session strategy.
pub fn session_layer(
    store: PostgresSessionStore,
    config: &Config,
) -> SessionManagerLayer<PostgresSessionStore, SignedCookie> {
    let same_site = match config.same_site_policy() {
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::None => SameSite::None,
    };

    // Secret length is enforced by Config::validate, so derive cannot panic.
    let key = Key::derive_from(config.session_secret.as_bytes());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_secure(config.secure_cookies())
        .with_http_only(true)
        .with_same_site(same_site)
        // Rolling: the deadline moves forward on every request, including
        // reads, so the record is saved unconditionally.
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            config.session_ttl_hours,
        )))
        .with_always_save(true)
        .with_signed(key)
}

/// Spawn the background task that deletes expired session rows, stopping
/// when shutdown begins.
pub fn spawn_expiry_sweep(store: PostgresSessionStore, shutdown: &Arc<Shutdown>) {
    let mut rx = shutdown.subscribe();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        // The first tick fires immediately; skip it so startup stays quiet.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match store.delete_expired().await {
                        Ok(0) => {}
                        Ok(removed) => debug!("[SESSION] Swept {} expired sessions", removed),
                        Err(e) => warn!("[SESSION] Expiry sweep failed: {}", e),
                    }
                }
                _ = rx.recv() => {
                    debug!("[SESSION] Expiry sweep stopping");
                    break;
                }
            }
        }
    });
}
