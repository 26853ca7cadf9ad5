//! Authentication strategy.
//!
//! One polymorphic [`Authenticator`] interface with two implementations,
//! selected once at startup from `AUTH_MODE`; the two never run together.
//!
//! - [`SessionAuthenticator`]: identity lives in the server-side session
//!   record reached through the request's [`Session`] extension.
//! - [`BearerAuthenticator`]: identity is reconstructed per request from the
//!   `Authorization: Bearer <jwt>` header; nothing is stored server-side.

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use tower_sessions::Session;

use lib_auth::{decode_jwt, encode_jwt, CurrentUser};
use lib_core::{AppError, AuthMode};

/// Session key under which the authenticated identity is stored.
pub const SESSION_USER_KEY: &str = "auth.user";

/// Strategy seam between the middleware chain and the two auth models.
#[async_trait]
pub trait Authenticator: Send + Sync + std::fmt::Debug {
    fn mode(&self) -> AuthMode;

    /// Resolve the request's identity, if any.
    async fn authenticate(&self, req: &Request) -> Result<CurrentUser, AppError>;

    /// Issue credentials after a verified login. Returns the bearer token in
    /// token mode; in session mode the credential travels in the cookie.
    async fn establish(
        &self,
        session: Option<&Session>,
        user: &CurrentUser,
    ) -> Result<Option<String>, AppError>;

    /// Drop the request's credentials (logout).
    async fn revoke(&self, session: Option<&Session>) -> Result<(), AppError>;
}

// region: --- SessionAuthenticator

#[derive(Debug, Clone)]
pub struct SessionAuthenticator;

#[async_trait]
impl Authenticator for SessionAuthenticator {
    fn mode(&self) -> AuthMode {
        AuthMode::CookieSession
    }

    // Written in async_trait's desugared form: `Request`'s body is not `Sync`,
    // so a boxed `Send` future cannot capture `&Request`. The session handle is
    // cloned out of the request before the future is built.
    fn authenticate<'life0, 'life1, 'async_trait>(
        &'life0 self,
        req: &'life1 Request,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<CurrentUser, AppError>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let session = req.extensions().get::<Session>().cloned();

        Box::pin(async move {
            let session = session
                .ok_or_else(|| AppError::Internal("Session layer not mounted".to_string()))?;

            session
                .get::<CurrentUser>(SESSION_USER_KEY)
                .await
                .map_err(|e| AppError::Internal(format!("Session read failed: {e}")))?
                .ok_or_else(|| AppError::Unauthorized("No authenticated session".to_string()))
        })
    }

    async fn establish(
        &self,
        session: Option<&Session>,
        user: &CurrentUser,
    ) -> Result<Option<String>, AppError> {
        let session = session
            .ok_or_else(|| AppError::Internal("Session layer not mounted".to_string()))?;

        // New session id on login, against fixation.
        session
            .cycle_id()
            .await
            .map_err(|e| AppError::Internal(format!("Session cycle failed: {e}")))?;

        session
            .insert(SESSION_USER_KEY, user)
            .await
            .map_err(|e| AppError::Internal(format!("Session write failed: {e}")))?;

        Ok(None)
    }

    async fn revoke(&self, session: Option<&Session>) -> Result<(), AppError> {
        if let Some(session) = session {
            session
                .flush()
                .await
                .map_err(|e| AppError::Internal(format!("Session flush failed: {e}")))?;
        }
        Ok(())
    }
}

// endregion: --- SessionAuthenticator

// region: --- BearerAuthenticator

#[derive(Debug, Clone)]
pub struct BearerAuthenticator {
    secret: String,
    ttl_hours: i64,
}

impl BearerAuthenticator {
    pub fn new(secret: String, ttl_hours: i64) -> Self {
        Self { secret, ttl_hours }
    }
}

#[async_trait]
impl Authenticator for BearerAuthenticator {
    fn mode(&self) -> AuthMode {
        AuthMode::BearerToken
    }

    // Desugared for the same reason as `SessionAuthenticator::authenticate`:
    // the header is copied out before the `Send` future is built.
    fn authenticate<'life0, 'life1, 'async_trait>(
        &'life0 self,
        req: &'life1 Request,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<CurrentUser, AppError>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let auth_header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned);

        Box::pin(async move {
            let auth_header = auth_header
                .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

            let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
                AppError::Unauthorized("Invalid Authorization header format".to_string())
            })?;

            let claims = decode_jwt(token, &self.secret).map_err(AppError::Unauthorized)?;

            claims.to_current_user().map_err(AppError::Unauthorized)
        })
    }

    async fn establish(
        &self,
        _session: Option<&Session>,
        user: &CurrentUser,
    ) -> Result<Option<String>, AppError> {
        let token = encode_jwt(user, &self.secret, self.ttl_hours).map_err(AppError::Internal)?;
        Ok(Some(token))
    }

    async fn revoke(&self, _session: Option<&Session>) -> Result<(), AppError> {
        // Stateless: the client discards the token.
        Ok(())
    }
}

// endregion: --- BearerAuthenticator

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use lib_auth::Role;

    fn bearer() -> BearerAuthenticator {
        BearerAuthenticator::new("a-test-secret-with-at-least-32-chars!".to_string(), 24)
    }

    fn user() -> CurrentUser {
        CurrentUser {
            id: 7,
            username: "maria".to_string(),
            email: "maria@example.com".to_string(),
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn test_bearer_roundtrip() {
        let auth = bearer();
        let token = auth.establish(None, &user()).await.unwrap().unwrap();

        let req = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let resolved = auth.authenticate(&req).await.unwrap();
        assert_eq!(resolved, user());
    }

    #[tokio::test]
    async fn test_bearer_rejects_missing_header() {
        let auth = bearer();
        let req = Request::builder().body(Body::empty()).unwrap();

        let err = auth.authenticate(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_bearer_rejects_malformed_header() {
        let auth = bearer();
        let req = Request::builder()
            .header(AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();

        let err = auth.authenticate(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_session_authenticator_requires_layer() {
        let auth = SessionAuthenticator;
        let req = Request::builder().body(Body::empty()).unwrap();

        // Without the session layer mounted this is a server bug, not a 401.
        let err = auth.authenticate(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
