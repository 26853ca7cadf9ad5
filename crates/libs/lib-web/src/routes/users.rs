//! Admin user management.

use axum::{
    extract::{Json, Path, State},
    middleware,
    routing::{get, patch},
    Router,
};
use tracing::info;

use lib_core::model::store::UserRepository;
use lib_core::AppError;
use shared::dto::{RoleRequest, UserInfo};

use crate::middleware::require_admin;
use crate::server::AppState;

const VALID_ROLES: &[&str] = &["admin", "staff", "customer"];

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list))
        .route("/{id}/role", patch(update_role))
        .route_layer(middleware::from_fn(require_admin))
        .with_state(state)
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserInfo>>, AppError> {
    let users = UserRepository::list(&state.db).await?;
    Ok(Json(
        users
            .into_iter()
            .map(|u| UserInfo {
                id: u.id,
                username: u.username,
                email: u.email,
                role: u.role,
            })
            .collect(),
    ))
}

/// Change a user's role. The role tag is validated strictly here, unlike
/// identity parsing which tolerates unknown tags.
async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<UserInfo>, AppError> {
    if !VALID_ROLES.contains(&req.role.as_str()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid role '{}', expected one of: {}",
            req.role,
            VALID_ROLES.join(", ")
        )));
    }

    let user = UserRepository::update_role(&state.db, id, &req.role)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    info!("[USERS] Role of {} (id: {}) set to {}", user.username, user.id, user.role);

    Ok(Json(UserInfo {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
    }))
}
