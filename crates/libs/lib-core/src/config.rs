//! # Application Configuration
//!
//! All runtime configuration is resolved once at startup from environment
//! variables into an immutable [`Config`], validated, and published through
//! [`init_config()`]. Request paths read it from [`AppState`] handles;
//! [`core_config()`] exists for the few places (error rendering) that have no
//! state handle.
//!
//! [`AppState`]: https://docs.rs/axum/latest/axum/extract/struct.State.html

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use lib_utils::envs::{get_env, get_env_or, get_env_parse_or};

/// Default CORS allow-list used when `ALLOWED_ORIGINS` is unset.
const DEFAULT_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
];

/// Origin patterns accepted in addition to the exact allow-list:
/// any localhost port (dev frontends) and any preview-deployment subdomain.
const ORIGIN_PATTERNS: &[&str] = &[
    r"^https?://(localhost|127\.0\.0\.1)(:\d+)?$",
    r"^https://[a-z0-9-]+\.vercel\.app$",
];

/// Fixed-window rate limit settings.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitSettings {
    pub window: Duration,
    pub max_requests: u32,
}

/// Deployment environment; toggles cookie flags and error redaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

/// Authentication model selected at startup; the two never run simultaneously.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    /// Signed session cookie backed by a Postgres `sessions` row (default).
    CookieSession,
    /// Stateless `Authorization: Bearer <jwt>` validated per request.
    BearerToken,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::CookieSession => "session",
            AuthMode::BearerToken => "token",
        }
    }
}

/// SameSite policy applied to the session cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSitePolicy {
    Lax,
    None,
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Postgres connection URL
    pub database_url: String,

    /// Listener port (default 5000)
    pub port: u16,

    pub environment: Environment,

    pub auth_mode: AuthMode,

    /// Secret signing the session cookie (session mode) or JWTs (token mode).
    ///
    /// **Must be at least 32 characters long.**
    pub session_secret: String,

    /// Session inactivity window in hours; refreshed on every request.
    pub session_ttl_hours: i64,

    /// Exact-match CORS allow-list
    pub allowed_origins: Vec<String>,

    /// Compiled CORS origin patterns
    pub cors_patterns: Vec<Regex>,

    /// Honor `X-Forwarded-For` for client IP resolution (behind a reverse proxy).
    pub trust_proxy: bool,

    pub global_rate_limit: RateLimitSettings,

    /// Counts only failed attempts on `/api/auth` routes.
    pub auth_rate_limit: RateLimitSettings,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = get_env_or(
            "DATABASE_URL",
            "postgres://localhost:5432/restaurant",
        );

        let port: u16 = get_env_parse_or("PORT", 5000)
            .map_err(|_| "PORT must be a valid port number".to_string())?;

        let environment = Environment::parse(&get_env_or("APP_ENV", "development"));

        let auth_mode = match get_env_or("AUTH_MODE", "session").as_str() {
            "token" => AuthMode::BearerToken,
            _ => AuthMode::CookieSession,
        };

        let session_secret = get_env("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set in environment".to_string())?;

        let session_ttl_hours: i64 = get_env_parse_or("SESSION_TTL_HOURS", 24)
            .map_err(|_| "SESSION_TTL_HOURS must be a valid number".to_string())?;

        let allowed_origins = match get_env("ALLOWED_ORIGINS") {
            Ok(raw) => parse_origins(&raw),
            Err(_) => DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        let cors_patterns = ORIGIN_PATTERNS
            .iter()
            .map(|p| Regex::new(p).map_err(|e| format!("Invalid CORS pattern {p}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;

        let trust_proxy: bool = get_env_parse_or("TRUST_PROXY", true)
            .map_err(|_| "TRUST_PROXY must be true or false".to_string())?;

        Ok(Self {
            database_url,
            port,
            environment,
            auth_mode,
            session_secret,
            session_ttl_hours,
            allowed_origins,
            cors_patterns,
            trust_proxy,
            global_rate_limit: RateLimitSettings {
                window: Duration::from_secs(15 * 60),
                max_requests: 100,
            },
            auth_rate_limit: RateLimitSettings {
                window: Duration::from_secs(15 * 60),
                max_requests: 10,
            },
        })
    }

    /// Validate configuration values against security and business rules.
    pub fn validate(&self) -> Result<(), String> {
        if self.session_secret.len() < 32 {
            return Err("SESSION_SECRET must be at least 32 characters long".to_string());
        }

        if self.session_ttl_hours < 1 || self.session_ttl_hours > 720 {
            return Err("SESSION_TTL_HOURS must be between 1 and 720 (30 days)".to_string());
        }

        if self.allowed_origins.is_empty() {
            return Err("ALLOWED_ORIGINS must contain at least one origin".to_string());
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    /// Secure cookie flag: on only in production (cookies over HTTPS).
    pub fn secure_cookies(&self) -> bool {
        self.is_production()
    }

    /// Cross-site cookies in production (frontend on another origin),
    /// permissive Lax in development.
    pub fn same_site_policy(&self) -> SameSitePolicy {
        if self.is_production() {
            SameSitePolicy::None
        } else {
            SameSitePolicy::Lax
        }
    }
}

/// Split a comma-separated origin list, dropping empty entries.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Initialize the global configuration from the environment.
///
/// Called once at server startup, before any request is served.
pub fn init_config() -> Result<&'static Config, String> {
    let config = Config::from_env()?;
    config.validate()?;

    CONFIG
        .set(config)
        .map_err(|_| "Config has already been initialized".to_string())?;

    Ok(core_config())
}

/// Get a reference to the global configuration.
///
/// # Panics
///
/// Panics if [`init_config()`] has not been called yet.
pub fn core_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Config must be initialized with init_config() before use")
}

/// Environment for contexts without a state handle (error rendering).
/// Falls back to Development when the global config is not initialized,
/// which is only the case in unit tests.
pub fn current_env() -> Environment {
    CONFIG
        .get()
        .map(|c| c.environment)
        .unwrap_or(Environment::Development)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost:5432/restaurant_test".to_string(),
            port: 5000,
            environment: Environment::Development,
            auth_mode: AuthMode::CookieSession,
            session_secret: "a-test-secret-with-at-least-32-chars!".to_string(),
            session_ttl_hours: 24,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            cors_patterns: ORIGIN_PATTERNS.iter().map(|p| Regex::new(p).unwrap()).collect(),
            trust_proxy: true,
            global_rate_limit: RateLimitSettings {
                window: Duration::from_secs(900),
                max_requests: 100,
            },
            auth_rate_limit: RateLimitSettings {
                window: Duration::from_secs(900),
                max_requests: 10,
            },
        }
    }

    #[test]
    fn test_validate_accepts_good_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = test_config();
        config.session_secret = "too-short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_ttl() {
        let mut config = test_config();
        config.session_ttl_hours = 0;
        assert!(config.validate().is_err());
        config.session_ttl_hours = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("prod"), Environment::Production);
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse("staging"), Environment::Development);
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins("http://a.test, http://b.test ,,http://c.test");
        assert_eq!(origins, vec!["http://a.test", "http://b.test", "http://c.test"]);
    }

    #[test]
    fn test_cookie_policy_by_environment() {
        let mut config = test_config();
        assert!(!config.secure_cookies());
        assert_eq!(config.same_site_policy(), SameSitePolicy::Lax);

        config.environment = Environment::Production;
        assert!(config.secure_cookies());
        assert_eq!(config.same_site_policy(), SameSitePolicy::None);
    }
}
