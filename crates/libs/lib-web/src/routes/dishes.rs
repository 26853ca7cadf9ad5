//! Dish handlers. Reads are public; writes are admin-only.

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::info;

use lib_core::model::store::models::Dish;
use lib_core::model::store::CatalogRepository;
use lib_core::AppError;
use lib_utils::validation::validate_not_empty;
use shared::dto::{DishRequest, MessageResponse};

use crate::middleware::require_admin;
use crate::server::AppState;

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/", post(create))
        .route("/{id}", put(update))
        .route("/{id}", delete(remove))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(list))
        .route("/{id}", get(find))
        .merge(admin)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct DishFilter {
    category_id: Option<i64>,
}

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<DishFilter>,
) -> Result<Json<Vec<Dish>>, AppError> {
    let dishes = CatalogRepository::list_dishes(&state.db, filter.category_id).await?;
    Ok(Json(dishes))
}

async fn find(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Dish>, AppError> {
    let dish = CatalogRepository::find_dish(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Dish {id} not found")))?;
    Ok(Json(dish))
}

fn validate_dish(req: &DishRequest) -> Result<(), AppError> {
    validate_not_empty(&req.name, "name").map_err(AppError::InvalidInput)?;
    if req.price_cents < 0 {
        return Err(AppError::InvalidInput(
            "price_cents must not be negative".to_string(),
        ));
    }
    Ok(())
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<DishRequest>,
) -> Result<(StatusCode, Json<Dish>), AppError> {
    validate_dish(&req)?;

    let dish = CatalogRepository::create_dish(
        &state.db,
        &req.name,
        &req.description,
        req.price_cents,
        req.category_id,
        req.available,
    )
    .await?;
    info!("[CATALOG] Dish created: {} (id: {})", dish.name, dish.id);
    Ok((StatusCode::CREATED, Json(dish)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<DishRequest>,
) -> Result<Json<Dish>, AppError> {
    validate_dish(&req)?;

    let dish = CatalogRepository::update_dish(
        &state.db,
        id,
        &req.name,
        &req.description,
        req.price_cents,
        req.category_id,
        req.available,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Dish {id} not found")))?;
    Ok(Json(dish))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted = CatalogRepository::delete_dish(&state.db, id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Dish {id} not found")));
    }
    info!("[CATALOG] Dish deleted: {}", id);
    Ok(Json(MessageResponse {
        message: "Dish deleted".to_string(),
    }))
}
