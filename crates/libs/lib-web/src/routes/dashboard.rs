//! Admin dashboard counts.

use axum::{extract::State, middleware, routing::get, Json, Router};

use lib_core::model::store::ReservationRepository;
use lib_core::AppError;
use shared::dto::DashboardSummary;

use crate::middleware::require_admin;
use crate::server::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/summary", get(summary))
        .route_layer(middleware::from_fn(require_admin))
        .with_state(state)
}

async fn summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    let (reservations_today, pending_reservations, dishes, users) =
        ReservationRepository::dashboard_counts(&state.db).await?;

    Ok(Json(DashboardSummary {
        reservations_today,
        pending_reservations,
        dishes,
        users,
    }))
}
