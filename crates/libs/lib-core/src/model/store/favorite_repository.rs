use sqlx::query_as;

use super::models::Dish;
use super::DbPool;

/// Per-user dish favorites.
pub struct FavoriteRepository;

impl FavoriteRepository {
    pub async fn list_for_user(pool: &DbPool, user_id: i64) -> Result<Vec<Dish>, sqlx::Error> {
        query_as::<_, Dish>(
            "SELECT d.* FROM dishes d
             JOIN favorites f ON f.dish_id = d.id
             WHERE f.user_id = $1
             ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn add(pool: &DbPool, user_id: i64, dish_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO favorites (user_id, dish_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(dish_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn remove(pool: &DbPool, user_id: i64, dish_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND dish_id = $2")
            .bind(user_id)
            .bind(dish_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
