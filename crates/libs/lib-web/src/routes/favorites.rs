//! Per-user dish favorites. All routes require login.

use axum::{
    extract::{Json, Path, State},
    middleware,
    routing::{delete, get, put},
    Router,
};

use lib_core::model::store::models::Dish;
use lib_core::model::store::{CatalogRepository, FavoriteRepository};
use lib_core::AppError;
use shared::dto::MessageResponse;

use crate::extract::AuthedUser;
use crate::middleware::require_auth;
use crate::server::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list))
        .route("/{dish_id}", put(add))
        .route("/{dish_id}", delete(remove))
        .route_layer(middleware::from_fn(require_auth))
        .with_state(state)
}

async fn list(
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<Vec<Dish>>, AppError> {
    let dishes = FavoriteRepository::list_for_user(&state.db, user.id).await?;
    Ok(Json(dishes))
}

/// Idempotent: favoriting an already-favorited dish is a no-op.
async fn add(
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
    Path(dish_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if CatalogRepository::find_dish(&state.db, dish_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Dish {dish_id} not found")));
    }

    FavoriteRepository::add(&state.db, user.id, dish_id).await?;
    Ok(Json(MessageResponse {
        message: "Favorite added".to_string(),
    }))
}

async fn remove(
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
    Path(dish_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let removed = FavoriteRepository::remove(&state.db, user.id, dish_id).await?;
    if !removed {
        return Err(AppError::NotFound(format!(
            "Dish {dish_id} is not a favorite"
        )));
    }
    Ok(Json(MessageResponse {
        message: "Favorite removed".to_string(),
    }))
}
