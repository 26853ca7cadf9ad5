use sqlx::query_as;
use sqlx::Row;

use super::models::Reservation;
use super::DbPool;

/// Reservation statuses accepted by the API.
pub const VALID_STATUSES: &[&str] = &["pending", "confirmed", "seated", "completed", "cancelled"];

pub struct ReservationRepository;

impl ReservationRepository {
    pub async fn create(
        pool: &DbPool,
        user_id: i64,
        guest_name: &str,
        party_size: i32,
        reserved_at: chrono::DateTime<chrono::Utc>,
        notes: &str,
    ) -> Result<Reservation, sqlx::Error> {
        query_as::<_, Reservation>(
            "INSERT INTO reservations (user_id, guest_name, party_size, reserved_at, notes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(user_id)
        .bind(guest_name)
        .bind(party_size)
        .bind(reserved_at)
        .bind(notes)
        .fetch_one(pool)
        .await
    }

    pub async fn list_all(pool: &DbPool) -> Result<Vec<Reservation>, sqlx::Error> {
        query_as::<_, Reservation>("SELECT * FROM reservations ORDER BY reserved_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_user(
        pool: &DbPool,
        user_id: i64,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE user_id = $1 ORDER BY reserved_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update_status(
        pool: &DbPool,
        id: i64,
        status: &str,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        query_as::<_, Reservation>(
            "UPDATE reservations SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Counts backing the admin dashboard.
    pub async fn dashboard_counts(pool: &DbPool) -> Result<(i64, i64, i64, i64), sqlx::Error> {
        let row = sqlx::query(
            "SELECT
                (SELECT count(*) FROM reservations
                 WHERE reserved_at::date = now()::date) AS reservations_today,
                (SELECT count(*) FROM reservations WHERE status = 'pending') AS pending,
                (SELECT count(*) FROM dishes) AS dishes,
                (SELECT count(*) FROM users) AS users",
        )
        .fetch_one(pool)
        .await?;

        Ok((
            row.get("reservations_today"),
            row.get("pending"),
            row.get("dishes"),
            row.get("users"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_statuses() {
        assert!(VALID_STATUSES.contains(&"pending"));
        assert!(VALID_STATUSES.contains(&"cancelled"));
        assert!(!VALID_STATUSES.contains(&"eaten"));
    }
}
