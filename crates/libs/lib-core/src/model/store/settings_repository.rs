use sqlx::query_as;

use super::models::Setting;
use super::DbPool;

pub struct SettingsRepository;

impl SettingsRepository {
    pub async fn list(pool: &DbPool) -> Result<Vec<Setting>, sqlx::Error> {
        query_as::<_, Setting>("SELECT * FROM settings ORDER BY key")
            .fetch_all(pool)
            .await
    }

    pub async fn get(pool: &DbPool, key: &str) -> Result<Option<Setting>, sqlx::Error> {
        query_as::<_, Setting>("SELECT * FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert(
        pool: &DbPool,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<Setting, sqlx::Error> {
        query_as::<_, Setting>(
            "INSERT INTO settings (key, value, updated_at) VALUES ($1, $2, now())
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
             RETURNING *",
        )
        .bind(key)
        .bind(value)
        .fetch_one(pool)
        .await
    }
}
