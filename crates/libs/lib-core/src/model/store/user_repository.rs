use sqlx::query_as;

use super::models::{User, UserForCreate};
use super::DbPool;

pub struct UserRepository;

impl UserRepository {
    /// Find user by email
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find user by username
    pub async fn find_by_username(
        pool: &DbPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Create a new user
    pub async fn create(pool: &DbPool, user: UserForCreate) -> Result<User, sqlx::Error> {
        query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(pool)
        .await
    }

    /// Update last login timestamp
    pub async fn update_last_login(pool: &DbPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// List all users, newest first
    pub async fn list(pool: &DbPool) -> Result<Vec<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    /// Change a user's role, returning the updated record if it exists
    pub async fn update_role(
        pool: &DbPool,
        id: i64,
        role: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("UPDATE users SET role = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(role)
            .fetch_optional(pool)
            .await
    }
}
