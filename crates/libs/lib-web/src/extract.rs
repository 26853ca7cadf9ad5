//! Handler extractors for identity and session access.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;

use lib_auth::CurrentUser;
use lib_core::AppError;

/// Extracts the authenticated identity, rejecting with 401 when absent.
///
/// The identity middleware populates request extensions; this extractor is
/// the handler-side view of it.
pub struct AuthedUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthedUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extracts the identity when present, without rejecting anonymous requests.
pub struct MaybeUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<CurrentUser>().cloned()))
    }
}

/// Extracts the session when the session layer is mounted (cookie-session
/// mode); `None` in bearer-token mode.
pub struct MaybeSession(pub Option<Session>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(parts.extensions.get::<Session>().cloned()))
    }
}
