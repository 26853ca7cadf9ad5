use sqlx::query_as;

use super::models::{Category, Dish, Menu};
use super::DbPool;

/// Categories, dishes, and menus.
pub struct CatalogRepository;

impl CatalogRepository {
    // region: --- Categories
    pub async fn list_categories(pool: &DbPool) -> Result<Vec<Category>, sqlx::Error> {
        query_as::<_, Category>("SELECT * FROM categories ORDER BY position, name")
            .fetch_all(pool)
            .await
    }

    pub async fn create_category(
        pool: &DbPool,
        name: &str,
        position: i32,
    ) -> Result<Category, sqlx::Error> {
        query_as::<_, Category>(
            "INSERT INTO categories (name, position) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(position)
        .fetch_one(pool)
        .await
    }

    pub async fn update_category(
        pool: &DbPool,
        id: i64,
        name: &str,
        position: i32,
    ) -> Result<Option<Category>, sqlx::Error> {
        query_as::<_, Category>(
            "UPDATE categories SET name = $2, position = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(position)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete_category(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
    // endregion: --- Categories

    // region: --- Dishes
    pub async fn list_dishes(
        pool: &DbPool,
        category_id: Option<i64>,
    ) -> Result<Vec<Dish>, sqlx::Error> {
        match category_id {
            Some(category_id) => {
                query_as::<_, Dish>(
                    "SELECT * FROM dishes WHERE category_id = $1 ORDER BY name",
                )
                .bind(category_id)
                .fetch_all(pool)
                .await
            }
            None => {
                query_as::<_, Dish>("SELECT * FROM dishes ORDER BY name")
                    .fetch_all(pool)
                    .await
            }
        }
    }

    pub async fn find_dish(pool: &DbPool, id: i64) -> Result<Option<Dish>, sqlx::Error> {
        query_as::<_, Dish>("SELECT * FROM dishes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create_dish(
        pool: &DbPool,
        name: &str,
        description: &str,
        price_cents: i64,
        category_id: Option<i64>,
        available: bool,
    ) -> Result<Dish, sqlx::Error> {
        query_as::<_, Dish>(
            "INSERT INTO dishes (name, description, price_cents, category_id, available)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(name)
        .bind(description)
        .bind(price_cents)
        .bind(category_id)
        .bind(available)
        .fetch_one(pool)
        .await
    }

    pub async fn update_dish(
        pool: &DbPool,
        id: i64,
        name: &str,
        description: &str,
        price_cents: i64,
        category_id: Option<i64>,
        available: bool,
    ) -> Result<Option<Dish>, sqlx::Error> {
        query_as::<_, Dish>(
            "UPDATE dishes
             SET name = $2, description = $3, price_cents = $4, category_id = $5, available = $6
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(price_cents)
        .bind(category_id)
        .bind(available)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete_dish(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dishes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
    // endregion: --- Dishes

    // region: --- Menus
    pub async fn list_menus(pool: &DbPool) -> Result<Vec<Menu>, sqlx::Error> {
        query_as::<_, Menu>("SELECT * FROM menus ORDER BY name")
            .fetch_all(pool)
            .await
    }

    pub async fn find_menu(pool: &DbPool, id: i64) -> Result<Option<Menu>, sqlx::Error> {
        query_as::<_, Menu>("SELECT * FROM menus WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create_menu(
        pool: &DbPool,
        name: &str,
        active: bool,
    ) -> Result<Menu, sqlx::Error> {
        query_as::<_, Menu>("INSERT INTO menus (name, active) VALUES ($1, $2) RETURNING *")
            .bind(name)
            .bind(active)
            .fetch_one(pool)
            .await
    }

    pub async fn menu_dishes(pool: &DbPool, menu_id: i64) -> Result<Vec<Dish>, sqlx::Error> {
        query_as::<_, Dish>(
            "SELECT d.* FROM dishes d
             JOIN menu_dishes md ON md.dish_id = d.id
             WHERE md.menu_id = $1
             ORDER BY d.name",
        )
        .bind(menu_id)
        .fetch_all(pool)
        .await
    }

    pub async fn attach_dish(
        pool: &DbPool,
        menu_id: i64,
        dish_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO menu_dishes (menu_id, dish_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(menu_id)
        .bind(dish_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn detach_dish(
        pool: &DbPool,
        menu_id: i64,
        dish_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM menu_dishes WHERE menu_id = $1 AND dish_id = $2")
            .bind(menu_id)
            .bind(dish_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
    // endregion: --- Menus
}
