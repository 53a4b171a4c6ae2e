//! Login and token validation.

use crate::auth::{issue_token, verify_password, AuthUser};
use crate::error::AppError;
use crate::model::UserInfo;
use crate::service::UserStore;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserInfo,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("username and password are required".into()));
    }
    let user = UserStore::find_by_username(&state.pool, &payload.username)
        .await?
        .ok_or(AppError::Unauthorized("invalid credentials"))?;
    if !verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::Unauthorized("invalid credentials"));
    }
    let token = issue_token(&user, state.config.jwt_secret.as_bytes())?;
    tracing::info!(username = %user.username, "login");
    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
        user: UserInfo::from(&user),
    }))
}

/// The extractor does the actual verification; reaching the handler body
/// means the token is good.
pub async fn validate(_user: AuthUser) -> Json<ValidateResponse> {
    Json(ValidateResponse { valid: true })
}
