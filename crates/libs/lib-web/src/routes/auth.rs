//! # Authentication Handlers
//!
//! Signup, login, logout and the `me` introspection endpoint.
//!
//! Handlers talk to the configured [`Authenticator`] for credential
//! issuance and revocation, so the same code serves both cookie-session
//! and bearer-token deployments. The whole group sits behind the auth
//! rate limiter, which counts only failed attempts.
//!
//! [`Authenticator`]: crate::strategy::Authenticator

use axum::{
    extract::{Json, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tracing::{debug, info, warn};

use lib_auth::{hash_password, verify_password, CurrentUser, Role};
use lib_core::model::store::user_repository::UserRepository;
use lib_core::AppError;
use lib_utils::validation::{validate_email, validate_min_length};
use shared::dto::{AuthResponse, LoginRequest, MessageResponse, SignupRequest, UserInfo};

use crate::extract::{AuthedUser, MaybeSession};
use crate::middleware::auth_rate_limit;
use crate::server::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_rate_limit,
        ))
        .with_state(state)
}

fn user_info(user: &CurrentUser) -> UserInfo {
    UserInfo {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
    }
}

/// Create a new account and log the caller in.
///
/// New accounts always get the least-privileged role; elevation happens
/// through the admin user management endpoints.
async fn signup(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    info!("[SIGNUP] New signup request for {}", req.email);

    validate_min_length(&req.username, 3, "username").map_err(AppError::InvalidInput)?;
    validate_email(&req.email).map_err(AppError::InvalidInput)?;

    if UserRepository::find_by_email(&state.db, &req.email)
        .await?
        .is_some()
    {
        warn!("[SIGNUP] Email already registered: {}", req.email);
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    if UserRepository::find_by_username(&state.db, &req.username)
        .await?
        .is_some()
    {
        warn!("[SIGNUP] Username already taken: {}", req.username);
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    // Also enforces the minimum password length.
    let password_hash = hash_password(&req.password).map_err(AppError::InvalidInput)?;

    let user = UserRepository::create(
        &state.db,
        lib_core::model::store::models::UserForCreate {
            username: req.username.clone(),
            email: req.email.clone(),
            password_hash,
            role: Role::Customer.as_str().to_string(),
        },
    )
    .await?;

    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: Role::parse(&user.role),
    };

    let token = state
        .authenticator
        .establish(session.as_ref(), &current)
        .await?;

    info!("[SIGNUP] User created: {} (id: {})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user_info(&current),
            token,
        }),
    ))
}

/// Verify credentials and establish a login.
///
/// Unknown email and wrong password answer with the same message, so the
/// endpoint does not confirm which emails exist.
async fn login(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    info!("[LOGIN] Login attempt for {}", req.email);

    let user = UserRepository::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| {
            warn!("[LOGIN] Unknown email: {}", req.email);
            AppError::Unauthorized("Invalid email or password".to_string())
        })?;

    if !user.is_active {
        warn!("[LOGIN] Deactivated account: {}", req.email);
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let verified = verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))?;
    if !verified {
        warn!("[LOGIN] Wrong password for {}", req.email);
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: Role::parse(&user.role),
    };

    let token = state
        .authenticator
        .establish(session.as_ref(), &current)
        .await?;

    if let Err(e) = UserRepository::update_last_login(&state.db, user.id).await {
        debug!("[LOGIN] Failed to record last login: {}", e);
    }

    info!("[LOGIN] Authenticated {} (id: {})", user.username, user.id);

    Ok(Json(AuthResponse {
        user: user_info(&current),
        token,
    }))
}

/// Drop the caller's credentials. Idempotent; logging out twice is fine.
async fn logout(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<MessageResponse>, AppError> {
    state.authenticator.revoke(session.as_ref()).await?;
    debug!("[LOGOUT] Credentials revoked");
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Who am I: the identity attached to the current request.
async fn me(AuthedUser(user): AuthedUser) -> Json<UserInfo> {
    Json(user_info(&user))
}
