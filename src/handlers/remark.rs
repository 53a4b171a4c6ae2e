//! Remark CRUD. Remarks always hang off an existing profile.

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::model::{NewRemark, Remark, RemarkPatch};
use crate::service::{ProfileStore, RemarkStore};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

pub async fn list_remarks(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<Vec<Remark>>, AppError> {
    let remarks = RemarkStore::list_for_profile(&state.pool, profile_id).await?;
    Ok(Json(remarks))
}

pub async fn create_remark(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<NewRemark>,
) -> Result<(StatusCode, Json<Remark>), AppError> {
    if payload.made_by.trim().is_empty()
        || payload.title.trim().is_empty()
        || payload.body.trim().is_empty()
    {
        return Err(AppError::Validation(
            "madeBy, title and body are required".into(),
        ));
    }
    if ProfileStore::get(&state.pool, payload.profile_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "profile {}",
            payload.profile_id
        )));
    }
    let now = Utc::now();
    let remark = Remark {
        id: Uuid::new_v4(),
        profile_id: payload.profile_id,
        kind: payload.kind,
        date: now,
        made_by: payload.made_by,
        title: payload.title,
        body: payload.body,
        created_at: now,
        updated_at: now,
    };
    let created = RemarkStore::insert(&state.pool, &remark).await?;
    tracing::info!(id = %created.id, profile_id = %created.profile_id, "remark created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_remark(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<RemarkPatch>,
) -> Result<Json<Remark>, AppError> {
    let updated = RemarkStore::update(&state.pool, id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("remark {}", id)))?;
    Ok(Json(updated))
}

pub async fn delete_remark(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !RemarkStore::delete(&state.pool, id).await? {
        return Err(AppError::NotFound(format!("remark {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
