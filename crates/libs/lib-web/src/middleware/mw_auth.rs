//! # Authentication Middleware
//!
//! Identity resolution plus route guards.
//!
//! [`load_identity`] runs on every request: it asks the configured
//! [`Authenticator`] for the caller's identity and, when one is found,
//! injects a [`CurrentUser`] into request extensions. It never rejects;
//! anonymous requests simply proceed without an identity.
//!
//! [`require_auth`] and [`require_admin`] are the guards mounted on
//! protected route groups. They read the extension left by
//! `load_identity` and answer `401`/`403` when the caller does not
//! qualify.
//!
//! [`Authenticator`]: crate::strategy::Authenticator

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use lib_auth::CurrentUser;
use lib_core::AppError;

use crate::server::AppState;

/// Resolve the caller's identity and stash it in request extensions.
///
/// Authentication failures here are logged at debug level and otherwise
/// ignored: a stale cookie or expired token makes the request anonymous,
/// not rejected. Route guards decide whether anonymity is acceptable.
pub async fn load_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match state.authenticator.authenticate(&req).await {
        Ok(user) => {
            debug!(
                "[AUTH] Resolved identity: {} (id: {}, role: {})",
                user.username,
                user.id,
                user.role.as_str()
            );
            req.extensions_mut().insert(user);
        }
        Err(AppError::Unauthorized(reason)) => {
            debug!("[AUTH] No identity for request: {}", reason);
        }
        Err(err) => {
            warn!("[AUTH] Identity resolution failed: {}", err);
        }
    }

    next.run(req).await
}

/// Guard requiring an authenticated caller.
pub async fn require_auth(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<CurrentUser>().is_none() {
        return Err(AppError::Unauthorized(
            "Authentication required".to_string(),
        ));
    }
    Ok(next.run(req).await)
}

/// Guard requiring an authenticated caller with the admin role.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    if !user.is_admin() {
        warn!(
            "[AUTH] Forbidden: {} (role: {}) attempted admin route {}",
            user.username,
            user.role.as_str(),
            req.uri().path()
        );
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(req).await)
}
