//! Schema setup: enum types, tables, indexes. Applied at startup, idempotent.

use crate::error::AppError;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Enum types referenced by the tables. CREATE TYPE has no IF NOT EXISTS, so
/// failures on re-run are ignored.
const ENUM_DDL: &[&str] = &[
    "CREATE TYPE payment_status AS ENUM ('not_paid', 'partial', 'full')",
    "CREATE TYPE profile_status AS ENUM ('active', 'inactive')",
    "CREATE TYPE remark_type AS ENUM ('suggestion', 'complaint', 'request')",
];

const TABLE_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'admin',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id UUID PRIMARY KEY,
        full_name TEXT NOT NULL,
        student_number TEXT NOT NULL,
        degree_program TEXT NOT NULL,
        picture_url TEXT NOT NULL DEFAULT '/placeholder.svg',
        package TEXT NOT NULL,
        has_paid BOOLEAN NOT NULL DEFAULT FALSE,
        payment_status payment_status NOT NULL DEFAULT 'not_paid',
        partial_amount DOUBLE PRECISION,
        payment_date TIMESTAMPTZ,
        is_claimed BOOLEAN NOT NULL DEFAULT FALSE,
        claim_date TIMESTAMPTZ,
        claimed_by TEXT,
        facebook_account TEXT,
        email TEXT,
        status profile_status NOT NULL DEFAULT 'active',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS remarks (
        id UUID PRIMARY KEY,
        profile_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        type remark_type NOT NULL,
        date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        made_by TEXT NOT NULL,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

const INDEX_DDL: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_profiles_student_number ON profiles (student_number)",
    "CREATE INDEX IF NOT EXISTS idx_profiles_status ON profiles (status)",
    "CREATE INDEX IF NOT EXISTS idx_remarks_profile_date ON remarks (profile_id, date DESC)",
];

/// Apply schema DDL: enum types, tables, indexes. Safe to re-run.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    for ddl in ENUM_DDL {
        let _ = sqlx::query(ddl).execute(pool).await;
    }
    for ddl in TABLE_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    for ddl in INDEX_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::debug!("schema migrations applied");
    Ok(())
}

/// Create the target database when it does not exist, by connecting to the
/// `postgres` maintenance database on the same server.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Config(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await.map_err(AppError::Db)?;
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await
            .map_err(AppError::Db)?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(AppError::Db)?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::Config("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_name_parsed_from_url() {
        let (admin, name) =
            parse_db_name_from_url("postgres://user:pw@localhost:5432/togatrack").unwrap();
        assert_eq!(admin, "postgres://user:pw@localhost:5432/postgres");
        assert_eq!(name, "togatrack");
    }

    #[test]
    fn query_suffix_is_stripped() {
        let (_, name) =
            parse_db_name_from_url("postgres://localhost/togatrack?sslmode=disable").unwrap();
        assert_eq!(name, "togatrack");
    }
}
