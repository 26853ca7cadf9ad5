use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// User entity representing a complete user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Data structure for creating a new user.
///
/// Password must be hashed before creating.
#[derive(Debug, Clone)]
pub struct UserForCreate {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Menu category.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub position: i32,
}

/// Dish offered by the restaurant.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dish {
    pub id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

/// Named menu (a curated set of dishes).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

/// Table reservation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: i64,
    pub user_id: Option<i64>,
    pub guest_name: String,
    pub party_size: i32,
    pub reserved_at: DateTime<Utc>,
    pub status: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Restaurant-wide setting (key/value).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
