//! Liveness endpoints.

use axum::{extract::State, routing::get, Json, Router};
use tracing::debug;

use lib_utils::time::now_utc;
use shared::dto::HealthResponse;

use crate::extract::MaybeUser;
use crate::server::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

/// Plain-text banner on `/`, outside the `/api` prefix.
pub async fn banner() -> &'static str {
    "Restaurant API server is running"
}

/// Liveness plus a snapshot of the caller's auth state.
///
/// Answers 200 even when the database is down; the `database` field tells
/// the story instead. Probing acquires a real connection because the pool
/// itself is lazy.
async fn health(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> Json<HealthResponse> {
    let database = match state.db.acquire().await {
        Ok(_) => "reachable",
        Err(e) => {
            debug!("[HEALTH] Database probe failed: {}", e);
            "unreachable"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        database: database.to_string(),
        auth_mode: state.authenticator.mode().as_str().to_string(),
        authenticated: user.is_some(),
        uptime_secs: (now_utc() - state.started_at).num_seconds(),
    })
}
