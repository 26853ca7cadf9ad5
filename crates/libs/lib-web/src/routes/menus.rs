//! Menu handlers. A menu is a named, curated set of dishes.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::json;
use tracing::info;

use lib_core::model::store::models::Menu;
use lib_core::model::store::CatalogRepository;
use lib_core::AppError;
use lib_utils::validation::validate_not_empty;
use shared::dto::{MenuRequest, MessageResponse};

use crate::middleware::require_admin;
use crate::server::AppState;

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/", post(create))
        .route("/{id}/dishes/{dish_id}", put(attach))
        .route("/{id}/dishes/{dish_id}", delete(detach))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(list))
        .route("/{id}", get(find))
        .merge(admin)
        .with_state(state)
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Menu>>, AppError> {
    let menus = CatalogRepository::list_menus(&state.db).await?;
    Ok(Json(menus))
}

/// A menu with its dishes inlined.
async fn find(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let menu = CatalogRepository::find_menu(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Menu {id} not found")))?;
    let dishes = CatalogRepository::menu_dishes(&state.db, id).await?;

    Ok(Json(json!({
        "id": menu.id,
        "name": menu.name,
        "active": menu.active,
        "dishes": dishes,
    })))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<MenuRequest>,
) -> Result<(StatusCode, Json<Menu>), AppError> {
    validate_not_empty(&req.name, "name").map_err(AppError::InvalidInput)?;

    let menu = CatalogRepository::create_menu(&state.db, &req.name, req.active).await?;
    info!("[CATALOG] Menu created: {} (id: {})", menu.name, menu.id);
    Ok((StatusCode::CREATED, Json(menu)))
}

async fn attach(
    State(state): State<AppState>,
    Path((id, dish_id)): Path<(i64, i64)>,
) -> Result<Json<MessageResponse>, AppError> {
    if CatalogRepository::find_menu(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!("Menu {id} not found")));
    }
    if CatalogRepository::find_dish(&state.db, dish_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Dish {dish_id} not found")));
    }

    CatalogRepository::attach_dish(&state.db, id, dish_id).await?;
    Ok(Json(MessageResponse {
        message: "Dish attached".to_string(),
    }))
}

async fn detach(
    State(state): State<AppState>,
    Path((id, dish_id)): Path<(i64, i64)>,
) -> Result<Json<MessageResponse>, AppError> {
    let detached = CatalogRepository::detach_dish(&state.db, id, dish_id).await?;
    if !detached {
        return Err(AppError::NotFound(format!(
            "Dish {dish_id} not on menu {id}"
        )));
    }
    Ok(Json(MessageResponse {
        message: "Dish detached".to_string(),
    }))
}
