//! # Server Setup
//!
//! Router assembly, middleware chain ordering, and the startup/shutdown
//! sequence.

// region:    --- Imports
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;
use tower_sessions::service::SignedCookie;
use tower_sessions::SessionManagerLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lib_core::config::init_config;
use lib_core::model::store::PostgresSessionStore;
use lib_core::{create_pool, probe_pool, AuthMode, Config, DbPool};
use lib_utils::time::now_utc;

use crate::cors::cors_layer;
use crate::middleware::{
    global_rate_limit, load_identity, log_requests, security_headers, stamp_req, RateLimiter,
};
use crate::routes;
use crate::session::{session_layer, spawn_expiry_sweep};
use crate::shutdown::Shutdown;
use crate::strategy::{Authenticator, BearerAuthenticator, SessionAuthenticator};
// endregion: --- Imports

/// Request bodies above this are rejected with 413.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

// region:    --- AppState

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub authenticator: Arc<dyn Authenticator>,
    pub global_limiter: Arc<RateLimiter>,
    pub auth_limiter: Arc<RateLimiter>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let authenticator: Arc<dyn Authenticator> = match config.auth_mode {
            AuthMode::CookieSession => Arc::new(SessionAuthenticator),
            AuthMode::BearerToken => Arc::new(BearerAuthenticator::new(
                config.session_secret.clone(),
                config.session_ttl_hours,
            )),
        };

        let global_limiter = Arc::new(RateLimiter::new(
            config.global_rate_limit.window,
            config.global_rate_limit.max_requests,
        ));
        let auth_limiter = Arc::new(RateLimiter::new(
            config.auth_rate_limit.window,
            config.auth_rate_limit.max_requests,
        ));

        Self {
            db,
            config: Arc::new(config),
            authenticator,
            global_limiter,
            auth_limiter,
            started_at: now_utc(),
        }
    }
}

impl axum::extract::FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

// endregion: --- AppState

// region:    --- Server Configuration

/// Deployment-level overrides that do not come from the environment.
pub struct ServerConfig {
    /// Bind address; defaults to `0.0.0.0:<PORT>`.
    pub bind_address: Option<String>,
    /// Database migrations path
    pub migrations_path: &'static str,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: None,
            migrations_path: "./migrations",
        }
    }
}

// endregion: --- Server Configuration

// region:    --- Server Setup

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug,sqlx=warn".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Initialize and start the HTTP server.
///
/// Startup order matters: configuration is validated before anything else
/// and a bad configuration aborts the boot, while an unreachable database
/// does not (the pool is lazy and the health endpoint reports the state).
pub async fn start_server(server_config: ServerConfig) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("[BOOT] Restaurant API server starting");

    let config = init_config().map_err(|e| anyhow::anyhow!(e))?;
    info!(
        "[BOOT] Environment: {:?}, auth mode: {}",
        config.environment,
        config.auth_mode.as_str()
    );

    let pool = create_pool(config)?;

    // Migrations are best-effort at startup; a down database surfaces on
    // the health endpoint rather than aborting the boot.
    match sqlx::migrate::Migrator::new(std::path::Path::new(server_config.migrations_path)).await {
        Ok(migrator) => match migrator.run(&pool).await {
            Ok(()) => info!("[BOOT] Migrations applied"),
            Err(e) => warn!("[BOOT] Migrations failed, continuing startup: {}", e),
        },
        Err(e) => warn!(
            "[BOOT] Could not load migrations from {}: {}",
            server_config.migrations_path, e
        ),
    }

    probe_pool(&pool).await;

    let state = AppState::new(pool.clone(), config.clone());

    let shutdown = Arc::new(Shutdown::new());
    shutdown.install_signal_handlers();
    shutdown.install_panic_hook();

    // The session layer only exists in cookie-session mode; bearer mode
    // keeps no server-side state at all.
    let sessions = match config.auth_mode {
        AuthMode::CookieSession => {
            let store = PostgresSessionStore::new(pool.clone());
            spawn_expiry_sweep(store.clone(), &shutdown);
            Some(session_layer(store, config))
        }
        AuthMode::BearerToken => None,
    };

    let app = create_router(state, sessions);
    log_routes();

    let bind_address = server_config
        .bind_address
        .unwrap_or_else(|| format!("0.0.0.0:{}", config.port));
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("[BOOT] Listening on http://{}", bind_address);

    let mut rx = shutdown.subscribe();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = rx.recv().await;
        info!("[SHUTDOWN] Draining in-flight requests");
    })
    .await?;

    info!("[SHUTDOWN] Listener closed, closing database pool");
    pool.close().await;
    shutdown.mark_closed();
    info!("[SHUTDOWN] Clean exit");

    Ok(())
}

/// Assemble the full middleware chain and route table.
///
/// Layer order (outermost first on the request path): trace, request
/// stamp, request logging, CORS, security headers, global rate limit,
/// body cap, session layer (cookie mode only), identity resolution.
pub fn create_router(
    state: AppState,
    sessions: Option<SessionManagerLayer<PostgresSessionStore, SignedCookie>>,
) -> Router {
    let api = Router::new()
        .nest("/auth", routes::auth::router(state.clone()))
        .nest("/categories", routes::categories::router(state.clone()))
        .nest("/dishes", routes::dishes::router(state.clone()))
        .nest("/menus", routes::menus::router(state.clone()))
        .nest("/reservations", routes::reservations::router(state.clone()))
        .nest("/favorites", routes::favorites::router(state.clone()))
        .nest("/users", routes::users::router(state.clone()))
        .nest("/settings", routes::settings::router(state.clone()))
        .nest("/dashboard", routes::dashboard::router(state.clone()))
        .merge(routes::health::router(state.clone()));

    let router = Router::new()
        .route("/", get(routes::health::banner))
        .nest("/api", api)
        .fallback(routes::fallback_404)
        .layer(from_fn_with_state(state.clone(), load_identity));

    let router = match sessions {
        Some(layer) => router.layer(layer),
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(from_fn_with_state(state.clone(), global_rate_limit))
        .layer(from_fn(security_headers))
        .layer(cors_layer(&state.config))
        .layer(from_fn(log_requests))
        .layer(from_fn(stamp_req))
        .layer(TraceLayer::new_for_http())
}

fn log_routes() {
    info!("[ROUTES] GET    /                      banner");
    info!("[ROUTES] GET    /api/health            liveness + auth snapshot");
    info!("[ROUTES] POST   /api/auth/signup       create account");
    info!("[ROUTES] POST   /api/auth/login        login");
    info!("[ROUTES] POST   /api/auth/logout       logout");
    info!("[ROUTES] GET    /api/auth/me           current identity");
    info!("[ROUTES] GET    /api/categories        list categories");
    info!("[ROUTES] GET    /api/dishes            list dishes");
    info!("[ROUTES] GET    /api/menus             list menus");
    info!("[ROUTES] GET    /api/reservations      list reservations (auth)");
    info!("[ROUTES] POST   /api/reservations      create reservation (auth)");
    info!("[ROUTES] GET    /api/favorites         list favorites (auth)");
    info!("[ROUTES] GET    /api/users             list users (admin)");
    info!("[ROUTES] GET    /api/settings          list settings");
    info!("[ROUTES] GET    /api/dashboard/summary counts (admin)");
}

// endregion: --- Server Setup

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use lib_core::config::{parse_origins, RateLimitSettings};
    use lib_core::Environment;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_config(global_cap: u32) -> Config {
        Config {
            database_url: "postgres://localhost:5432/restaurant_test".to_string(),
            port: 0,
            environment: Environment::Development,
            auth_mode: AuthMode::BearerToken,
            session_secret: "0123456789abcdef0123456789abcdef".to_string(),
            session_ttl_hours: 24,
            allowed_origins: parse_origins("http://localhost:3000"),
            cors_patterns: Vec::new(),
            trust_proxy: false,
            global_rate_limit: RateLimitSettings {
                window: Duration::from_secs(60),
                max_requests: global_cap,
            },
            auth_rate_limit: RateLimitSettings {
                window: Duration::from_secs(60),
                max_requests: 10,
            },
        }
    }

    fn test_app(global_cap: u32) -> Router {
        let config = test_config(global_cap);
        let pool = create_pool(&config).unwrap();
        // Bearer mode: no session layer, no database needed for these tests.
        create_router(AppState::new(pool, config), None)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn unknown_route_gets_json_404() {
        let app = test_app(100);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_string(response).await;
        assert!(body.contains("Route not found"));
        assert!(body.contains("/api/nope"));
        assert!(body.contains("GET"));
    }

    #[tokio::test]
    async fn responses_carry_security_headers_and_request_id() {
        let app = test_app(100);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
        assert!(headers.get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn global_limiter_rejects_past_the_cap() {
        let app = test_app(2);

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("ratelimit-limit").unwrap(), "2");
    }

    #[tokio::test]
    async fn cors_allows_listed_origin() {
        let app = test_app(100);
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/health")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn cors_denies_unlisted_origin() {
        let app = test_app(100);
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/health")
                    .header(header::ORIGIN, "https://evil.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = test_app(100);
        let big = vec![b'a'; BODY_LIMIT_BYTES + 1];
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(big))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn auth_limiter_counts_failures_not_successes() {
        let app = test_app(100);

        // Successful attempts never consume the failure budget, even well
        // past the cap of 10.
        for _ in 0..15 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(Method::POST)
                        .uri("/api/auth/logout")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        // Ten failed attempts exhaust it. Malformed JSON is rejected with
        // 400 before any handler logic runs, which is failure enough.
        for _ in 0..10 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(Method::POST)
                        .uri("/api/auth/login")
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from("not json"))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        // The eleventh attempt is rejected up front, whatever it was.
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("ratelimit-remaining").unwrap(), "0");
    }

    #[tokio::test]
    async fn protected_route_requires_identity() {
        let app = test_app(100);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/reservations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_route_rejects_customer_token() {
        use lib_auth::{encode_jwt, CurrentUser, Role};

        let config = test_config(100);
        let token = encode_jwt(
            &CurrentUser {
                id: 1,
                username: "casual".to_string(),
                email: "casual@example.com".to_string(),
                role: Role::Customer,
            },
            &config.session_secret,
            1,
        )
        .unwrap();

        let pool = create_pool(&config).unwrap();
        let app = create_router(AppState::new(pool, config), None);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/users")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
