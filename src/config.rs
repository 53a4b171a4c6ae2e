//! Environment-driven configuration. `.env` is loaded by the binary before this runs.

use crate::error::AppError;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_JWT_SECRET: &str = "your-secret-key";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    /// Directory where uploaded profile pictures are stored and served from.
    pub uploads_dir: PathBuf,
    /// Base URL prefixed to stored picture paths in API responses.
    pub public_base_url: String,
    pub admin_username: String,
    pub admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let bind_addr = env_or("BIND_ADDR", DEFAULT_BIND_ADDR);
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL must be set".into()))?;
        let jwt_secret = env_or("JWT_SECRET", DEFAULT_JWT_SECRET);
        if jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("JWT_SECRET not set, using the built-in development secret");
        }
        let uploads_dir = PathBuf::from(env_or("UPLOADS_DIR", DEFAULT_UPLOADS_DIR));
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| default_base_url(&bind_addr));
        Ok(Self {
            bind_addr,
            database_url,
            jwt_secret,
            uploads_dir,
            public_base_url,
            admin_username: env_or("ADMIN_USERNAME", "admin"),
            admin_password: env_or("ADMIN_PASSWORD", "password"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Dashboards talk to localhost in development, so the fallback keeps the
/// bind port but swaps any wildcard host for localhost.
fn default_base_url(bind_addr: &str) -> String {
    let port = bind_addr.rsplit(':').next().unwrap_or("3001");
    format!("http://localhost:{}", port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_uses_bind_port() {
        assert_eq!(default_base_url("0.0.0.0:8080"), "http://localhost:8080");
        assert_eq!(default_base_url("127.0.0.1:3001"), "http://localhost:3001");
    }
}
