//! Menu category handlers. Reads are public; writes are admin-only.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get},
    Router,
};
use tracing::info;

use lib_core::model::store::models::Category;
use lib_core::model::store::CatalogRepository;
use lib_core::AppError;
use lib_utils::validation::validate_not_empty;
use shared::dto::{CategoryRequest, MessageResponse};

use crate::middleware::require_admin;
use crate::server::AppState;

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/", axum::routing::post(create))
        .route("/{id}", axum::routing::put(update))
        .route("/{id}", delete(remove))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(list))
        .merge(admin)
        .with_state(state)
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CatalogRepository::list_categories(&state.db).await?;
    Ok(Json(categories))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    validate_not_empty(&req.name, "name").map_err(AppError::InvalidInput)?;

    let category = CatalogRepository::create_category(&state.db, &req.name, req.position).await?;
    info!("[CATALOG] Category created: {} (id: {})", category.name, category.id);
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    validate_not_empty(&req.name, "name").map_err(AppError::InvalidInput)?;

    let category = CatalogRepository::update_category(&state.db, id, &req.name, req.position)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {id} not found")))?;
    Ok(Json(category))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted = CatalogRepository::delete_category(&state.db, id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Category {id} not found")));
    }
    info!("[CATALOG] Category deleted: {}", id);
    Ok(Json(MessageResponse {
        message: "Category deleted".to_string(),
    }))
}
