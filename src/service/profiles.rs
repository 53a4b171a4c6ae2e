//! Profile table access. List filtering/sorting is built with QueryBuilder
//! against a whitelisted column set.

use crate::error::AppError;
use crate::model::{PaymentStatus, Profile, ProfileStatus};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Server-side counterpart of the dashboard's table filters.
#[derive(Debug, Clone)]
pub struct ProfileListQuery {
    pub status: Option<ProfileStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub package: Option<String>,
    pub degree_program: Option<String>,
    pub is_claimed: Option<bool>,
    /// Substring match over full name and student number.
    pub q: Option<String>,
    pub sort: &'static str,
    pub order: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ProfileListQuery {
    fn default() -> Self {
        Self {
            status: None,
            payment_status: None,
            package: None,
            degree_program: None,
            is_claimed: None,
            q: None,
            sort: "created_at",
            order: SortOrder::Desc,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl ProfileListQuery {
    /// Parse from query-string parameters. Unknown parameters are ignored;
    /// invalid enum values are rejected so filters never silently match
    /// nothing.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let mut query = Self::default();
        for (key, value) in params {
            match key.as_str() {
                "status" => {
                    query.status = Some(ProfileStatus::parse(value).ok_or_else(|| {
                        AppError::Validation(format!("invalid status filter: {}", value))
                    })?);
                }
                "payment_status" | "paymentStatus" => {
                    query.payment_status = Some(PaymentStatus::parse(value).ok_or_else(|| {
                        AppError::Validation(format!("invalid payment_status filter: {}", value))
                    })?);
                }
                "package" => query.package = Some(value.clone()),
                "degree_program" | "degreeProgram" => {
                    query.degree_program = Some(value.clone());
                }
                "is_claimed" | "isClaimed" => {
                    query.is_claimed = Some(value.parse().map_err(|_| {
                        AppError::Validation(format!("invalid is_claimed filter: {}", value))
                    })?);
                }
                "q" => {
                    if !value.is_empty() {
                        query.q = Some(value.clone());
                    }
                }
                "sort" => query.sort = sort_column(value).unwrap_or(query.sort),
                "order" => {
                    query.order = match value.as_str() {
                        "asc" => SortOrder::Asc,
                        "desc" => SortOrder::Desc,
                        _ => query.order,
                    };
                }
                "limit" => {
                    if let Ok(n) = value.parse::<u32>() {
                        query.limit = n.min(MAX_LIMIT);
                    }
                }
                "offset" => {
                    if let Ok(n) = value.parse::<u32>() {
                        query.offset = n;
                    }
                }
                _ => {}
            }
        }
        Ok(query)
    }
}

/// Sort keys accepted on the wire (camelCase as the dashboard sends them,
/// snake_case for direct API use) mapped to real columns.
fn sort_column(key: &str) -> Option<&'static str> {
    match key {
        "fullName" | "full_name" => Some("full_name"),
        "studentNumber" | "student_number" => Some("student_number"),
        "degreeProgram" | "degree_program" => Some("degree_program"),
        "package" => Some("package"),
        "paymentStatus" | "payment_status" => Some("payment_status"),
        "claimDate" | "claim_date" => Some("claim_date"),
        "createdAt" | "created_at" => Some("created_at"),
        _ => None,
    }
}

const INSERT_SQL: &str = r#"
    INSERT INTO profiles (
        id, full_name, student_number, degree_program, picture_url, package,
        has_paid, payment_status, partial_amount, payment_date,
        is_claimed, claim_date, claimed_by, facebook_account, email, status,
        created_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
    RETURNING *
"#;

const UPDATE_SQL: &str = r#"
    UPDATE profiles SET
        full_name = $2, student_number = $3, degree_program = $4,
        picture_url = $5, package = $6, has_paid = $7, payment_status = $8,
        partial_amount = $9, payment_date = $10, is_claimed = $11,
        claim_date = $12, claimed_by = $13, facebook_account = $14,
        email = $15, status = $16, updated_at = $17
    WHERE id = $1
    RETURNING *
"#;

pub struct ProfileStore;

impl ProfileStore {
    pub async fn insert(pool: &PgPool, profile: &Profile) -> Result<Profile, AppError> {
        let row = sqlx::query_as::<_, Profile>(INSERT_SQL)
            .bind(profile.id)
            .bind(&profile.full_name)
            .bind(&profile.student_number)
            .bind(&profile.degree_program)
            .bind(&profile.picture_url)
            .bind(&profile.package)
            .bind(profile.has_paid)
            .bind(profile.payment_status)
            .bind(profile.partial_amount)
            .bind(profile.payment_date)
            .bind(profile.is_claimed)
            .bind(profile.claim_date)
            .bind(&profile.claimed_by)
            .bind(&profile.facebook_account)
            .bind(&profile.email)
            .bind(profile.status)
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .fetch_one(pool)
            .await?;
        Ok(row)
    }

    pub async fn list(pool: &PgPool, query: &ProfileListQuery) -> Result<Vec<Profile>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM profiles");
        let mut sep = " WHERE ";
        if let Some(status) = query.status {
            qb.push(sep).push("status = ").push_bind(status);
            sep = " AND ";
        }
        if let Some(payment_status) = query.payment_status {
            qb.push(sep).push("payment_status = ").push_bind(payment_status);
            sep = " AND ";
        }
        if let Some(ref package) = query.package {
            qb.push(sep).push("package = ").push_bind(package.clone());
            sep = " AND ";
        }
        if let Some(ref degree_program) = query.degree_program {
            qb.push(sep)
                .push("degree_program = ")
                .push_bind(degree_program.clone());
            sep = " AND ";
        }
        if let Some(is_claimed) = query.is_claimed {
            qb.push(sep).push("is_claimed = ").push_bind(is_claimed);
            sep = " AND ";
        }
        if let Some(ref q) = query.q {
            let pattern = format!("%{}%", q);
            qb.push(sep)
                .push("(full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR student_number ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        // Sort column and direction come from a fixed whitelist, never from
        // raw input.
        qb.push(" ORDER BY ")
            .push(query.sort)
            .push(" ")
            .push(query.order.as_sql());
        qb.push(" LIMIT ").push_bind(query.limit.min(MAX_LIMIT) as i64);
        qb.push(" OFFSET ").push_bind(query.offset as i64);

        let rows = qb.build_query_as::<Profile>().fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Write the full row state computed by the update policy.
    pub async fn update(pool: &PgPool, profile: &Profile) -> Result<Profile, AppError> {
        let row = sqlx::query_as::<_, Profile>(UPDATE_SQL)
            .bind(profile.id)
            .bind(&profile.full_name)
            .bind(&profile.student_number)
            .bind(&profile.degree_program)
            .bind(&profile.picture_url)
            .bind(&profile.package)
            .bind(profile.has_paid)
            .bind(profile.payment_status)
            .bind(profile.partial_amount)
            .bind(profile.payment_date)
            .bind(profile.is_claimed)
            .bind(profile.claim_date)
            .bind(&profile.claimed_by)
            .bind(&profile.facebook_account)
            .bind(&profile.email)
            .bind(profile.status)
            .bind(profile.updated_at)
            .fetch_one(pool)
            .await?;
        Ok(row)
    }

    /// Remarks go with the profile via ON DELETE CASCADE.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
