//! User table access.

use crate::error::AppError;
use crate::model::User;
use sqlx::PgPool;

pub struct UserStore;

impl UserStore {
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn insert(pool: &PgPool, user: &User) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.created_at)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }
}
