//! Token-based authentication: JWT issue/verify, password hashing, the
//! Bearer-token extractor, and initial admin seeding.

use crate::error::AppError;
use crate::model::User;
use crate::service::users::UserStore;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// Tokens expire 24 hours after issue.
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(user: &User, secret: &[u8]) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role.clone(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AppError::Internal(format!("token encode: {}", e)))
}

pub fn verify_token(token: &str, secret: &[u8]) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("invalid token"))
}

/// Salted SHA-256, stored as `sha256$<salt-hex>$<digest-hex>`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = salted_digest(&salt, password);
    format!("sha256${}${}", hex::encode(salt), hex::encode(digest))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("sha256"), Some(salt_hex), Some(digest_hex), None) => {
            let Ok(salt) = hex::decode(salt_hex) else {
                return false;
            };
            hex::encode(salted_digest(&salt, password)) == digest_hex
        }
        _ => false,
    }
}

fn salted_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Extractor for the authenticated admin; rejects with 401 when the
/// `Authorization: Bearer` token is missing, malformed, or expired.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized("missing bearer token"))?;
        let claims = verify_token(token, state.config.jwt_secret.as_bytes())?;
        Ok(AuthUser(claims))
    }
}

/// Create the initial admin account when no user with the configured
/// username exists yet.
pub async fn seed_initial_admin(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<(), AppError> {
    if UserStore::find_by_username(pool, username).await?.is_some() {
        return Ok(());
    }
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: hash_password(password),
        role: "admin".into(),
        created_at: Utc::now(),
    };
    UserStore::insert(pool, &user).await?;
    tracing::info!(username, "initial admin user created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "admin".into(),
            password_hash: hash_password("password"),
            role: "admin".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn password_hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "md5$ab$cd"));
        assert!(!verify_password("anything", "sha256$nothex$nothex"));
    }

    #[test]
    fn token_round_trip() {
        let user = sample_user();
        let token = issue_token(&user, b"secret").unwrap();
        let claims = verify_token(&token, b"secret").unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, "admin");
        assert!(claims.exp - claims.iat == TOKEN_TTL_SECS);
    }

    #[test]
    fn token_rejected_with_wrong_secret() {
        let token = issue_token(&sample_user(), b"secret").unwrap();
        assert!(verify_token(&token, b"other").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "admin".into(),
            role: "admin".into(),
            iat: now - 2 * TOKEN_TTL_SECS,
            exp: now - TOKEN_TTL_SECS,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(verify_token(&token, b"secret").is_err());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(verify_token("not.a.jwt", b"secret").is_err());
    }
}
