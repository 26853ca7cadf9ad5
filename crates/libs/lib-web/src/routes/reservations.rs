//! Reservation handlers.
//!
//! All routes require login. Customers see and create their own
//! reservations; staff and admins see everything and drive the status
//! lifecycle.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Router,
};
use tracing::info;

use lib_core::model::store::models::Reservation;
use lib_core::model::store::reservation_repository::VALID_STATUSES;
use lib_core::model::store::ReservationRepository;
use lib_core::AppError;
use lib_utils::time::now_utc;
use lib_utils::validation::{validate_not_empty, validate_range};
use shared::dto::{ReservationRequest, ReservationStatusRequest};

use crate::extract::AuthedUser;
use crate::middleware::{require_admin, require_auth};
use crate::server::AppState;

/// Largest party bookable online; bigger groups call the restaurant.
const MAX_PARTY_SIZE: i64 = 12;

pub fn router(state: AppState) -> Router {
    let staff = Router::new()
        .route("/{id}/status", patch(update_status))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(list))
        .route("/", post(create))
        .merge(staff)
        .route_layer(middleware::from_fn(require_auth))
        .with_state(state)
}

/// Customers get their own reservations; staff get all of them.
async fn list(
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let reservations = if user.is_staff() {
        ReservationRepository::list_all(&state.db).await?
    } else {
        ReservationRepository::list_for_user(&state.db, user.id).await?
    };
    Ok(Json(reservations))
}

async fn create(
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
    Json(req): Json<ReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    validate_not_empty(&req.guest_name, "guest_name").map_err(AppError::InvalidInput)?;
    validate_range(req.party_size as i64, 1, MAX_PARTY_SIZE, "party_size")
        .map_err(AppError::InvalidInput)?;

    if req.reserved_at <= now_utc() {
        return Err(AppError::InvalidInput(
            "reserved_at must be in the future".to_string(),
        ));
    }

    let reservation = ReservationRepository::create(
        &state.db,
        user.id,
        &req.guest_name,
        req.party_size,
        req.reserved_at,
        &req.notes,
    )
    .await?;

    info!(
        "[RESERVATION] Created id {} for user {} ({} guests at {})",
        reservation.id, user.id, reservation.party_size, reservation.reserved_at
    );

    Ok((StatusCode::CREATED, Json(reservation)))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ReservationStatusRequest>,
) -> Result<Json<Reservation>, AppError> {
    if !VALID_STATUSES.contains(&req.status.as_str()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid status '{}', expected one of: {}",
            req.status,
            VALID_STATUSES.join(", ")
        )));
    }

    let reservation = ReservationRepository::update_status(&state.db, id, &req.status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reservation {id} not found")))?;

    info!(
        "[RESERVATION] Status of {} set to {}",
        reservation.id, reservation.status
    );

    Ok(Json(reservation))
}
