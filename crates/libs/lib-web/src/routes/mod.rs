//! # Route Groups
//!
//! Handlers grouped by resource, each exposing a `router(state)` that the
//! server nests under `/api`.

use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use serde_json::json;
use tracing::debug;

// region:    --- Modules
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod dishes;
pub mod favorites;
pub mod health;
pub mod menus;
pub mod reservations;
pub mod settings;
pub mod users;
// endregion: --- Modules

/// Fallback for unmatched routes: a JSON 404 naming the missed path.
pub async fn fallback_404(method: Method, uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
    debug!("[404] No route for {} {}", method, uri.path());
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "method": method.as_str(),
            "path": uri.path(),
        })),
    )
}
