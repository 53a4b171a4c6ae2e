//! Remark table access.

use crate::error::AppError;
use crate::model::{Remark, RemarkPatch};
use sqlx::PgPool;
use uuid::Uuid;

const INSERT_SQL: &str = r#"
    INSERT INTO remarks (id, profile_id, type, date, made_by, title, body, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    RETURNING *
"#;

const UPDATE_SQL: &str = r#"
    UPDATE remarks SET
        type = COALESCE($2, type),
        made_by = COALESCE($3, made_by),
        title = COALESCE($4, title),
        body = COALESCE($5, body),
        updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

pub struct RemarkStore;

impl RemarkStore {
    /// Remarks for one profile, newest first.
    pub async fn list_for_profile(pool: &PgPool, profile_id: Uuid) -> Result<Vec<Remark>, AppError> {
        let rows = sqlx::query_as::<_, Remark>(
            "SELECT * FROM remarks WHERE profile_id = $1 ORDER BY date DESC",
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert(pool: &PgPool, remark: &Remark) -> Result<Remark, AppError> {
        let row = sqlx::query_as::<_, Remark>(INSERT_SQL)
            .bind(remark.id)
            .bind(remark.profile_id)
            .bind(remark.kind)
            .bind(remark.date)
            .bind(&remark.made_by)
            .bind(&remark.title)
            .bind(&remark.body)
            .bind(remark.created_at)
            .bind(remark.updated_at)
            .fetch_one(pool)
            .await?;
        Ok(row)
    }

    /// Apply the supplied fields only; absent fields keep their value.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: &RemarkPatch,
    ) -> Result<Option<Remark>, AppError> {
        let row = sqlx::query_as::<_, Remark>(UPDATE_SQL)
            .bind(id)
            .bind(patch.kind)
            .bind(&patch.made_by)
            .bind(&patch.title)
            .bind(&patch.body)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM remarks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
