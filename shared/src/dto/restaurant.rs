use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Create/update a menu category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub position: i32,
}

/// Create/update a dish
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DishRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub category_id: Option<i64>,
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

/// Create a named menu
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuRequest {
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// Create a reservation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationRequest {
    pub guest_name: String,
    pub party_size: i32,
    pub reserved_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

/// Update a reservation's status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationStatusRequest {
    pub status: String,
}

/// Update a restaurant setting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettingRequest {
    pub value: serde_json::Value,
}

/// Change a user's role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRequest {
    pub role: String,
}

/// Liveness + auth snapshot returned by `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub auth_mode: String,
    pub authenticated: bool,
    pub uptime_secs: i64,
}

/// Admin dashboard counts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSummary {
    pub reservations_today: i64,
    pub pending_reservations: i64,
    pub dishes: i64,
    pub users: i64,
}
