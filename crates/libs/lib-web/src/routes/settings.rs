//! Restaurant-wide settings (opening hours, contact details and the like).
//! Reads are public; writes are admin-only.

use axum::{
    extract::{Json, Path, State},
    middleware,
    routing::{get, put},
    Router,
};
use tracing::info;

use lib_core::model::store::models::Setting;
use lib_core::model::store::SettingsRepository;
use lib_core::AppError;
use shared::dto::SettingRequest;

use crate::middleware::require_admin;
use crate::server::AppState;

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/{key}", put(upsert))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(list))
        .route("/{key}", get(find))
        .merge(admin)
        .with_state(state)
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Setting>>, AppError> {
    let settings = SettingsRepository::list(&state.db).await?;
    Ok(Json(settings))
}

async fn find(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Setting>, AppError> {
    let setting = SettingsRepository::get(&state.db, &key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Setting '{key}' not found")))?;
    Ok(Json(setting))
}

async fn upsert(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SettingRequest>,
) -> Result<Json<Setting>, AppError> {
    let setting = SettingsRepository::upsert(&state.db, &key, &req.value).await?;
    info!("[SETTINGS] Updated '{}'", setting.key);
    Ok(Json(setting))
}
