//! Profile CRUD over multipart forms (the create/update forms carry an
//! optional picture file next to the text fields).

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::model::profile::{apply_patch, PLACEHOLDER_PICTURE_URL};
use crate::model::{NewProfile, PaymentStatus, Profile, ProfilePatch, ProfileStatus};
use crate::service::{ProfileListQuery, ProfileStore};
use crate::state::AppState;
use crate::upload::{PictureFile, PictureStore};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

fn picture_store(state: &AppState) -> PictureStore {
    PictureStore::new(&state.config.uploads_dir, &state.config.public_base_url)
}

/// Split a multipart form into its text fields and the optional `picture`
/// file part.
async fn read_profile_form(
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Option<PictureFile>), AppError> {
    let mut fields = HashMap::new();
    let mut picture = None;
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "picture" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?.to_vec();
            // Browsers submit an empty part for an untouched file input.
            if !bytes.is_empty() && !file_name.is_empty() {
                picture = Some(PictureFile { file_name, bytes });
            }
        } else {
            fields.insert(name, field.text().await?);
        }
    }
    Ok((fields, picture))
}

/// Trimmed, non-empty value or a validation error.
fn required(fields: &HashMap<String, String>, name: &str) -> Result<String, AppError> {
    optional(fields, name).ok_or_else(|| AppError::Validation(format!("{} is required", name)))
}

/// Trimmed value; absent or empty means "not supplied".
fn optional(fields: &HashMap<String, String>, name: &str) -> Option<String> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_payment_status(value: &str) -> Result<PaymentStatus, AppError> {
    PaymentStatus::parse(value)
        .ok_or_else(|| AppError::Validation(format!("invalid paymentStatus: {}", value)))
}

fn parse_amount(value: &str) -> Result<f64, AppError> {
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("partialAmount must be numeric: {}", value)))
}

fn parse_bool_field(name: &str, value: &str) -> Result<bool, AppError> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "{} must be a boolean: {}",
            name, value
        ))),
    }
}

/// RFC 3339 timestamps, with a date-only fallback for plain HTML date inputs.
fn parse_datetime(name: &str, value: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(AppError::Validation(format!(
        "{} must be a valid date: {}",
        name, value
    )))
}

fn validate_email(value: String) -> Result<String, AppError> {
    if value.contains('@') && value.len() >= 3 {
        Ok(value)
    } else {
        Err(AppError::Validation(format!("invalid email: {}", value)))
    }
}

fn parse_new_profile(fields: &HashMap<String, String>) -> Result<NewProfile, AppError> {
    let payment_status = match optional(fields, "paymentStatus") {
        Some(v) => parse_payment_status(&v)?,
        None => PaymentStatus::NotPaid,
    };
    Ok(NewProfile {
        full_name: required(fields, "fullName")?,
        student_number: required(fields, "studentNumber")?,
        degree_program: required(fields, "degreeProgram")?,
        package: required(fields, "package")?,
        payment_status,
        partial_amount: optional(fields, "partialAmount")
            .map(|v| parse_amount(&v))
            .transpose()?,
        payment_date: optional(fields, "paymentDate")
            .map(|v| parse_datetime("paymentDate", &v))
            .transpose()?,
        is_claimed: optional(fields, "isClaimed")
            .map(|v| parse_bool_field("isClaimed", &v))
            .transpose()?
            .unwrap_or(false),
        claim_date: optional(fields, "claimDate")
            .map(|v| parse_datetime("claimDate", &v))
            .transpose()?,
        claimed_by: optional(fields, "claimedBy"),
        facebook_account: optional(fields, "facebookAccount"),
        email: optional(fields, "email").map(validate_email).transpose()?,
    })
}

fn parse_profile_patch(fields: &HashMap<String, String>) -> Result<ProfilePatch, AppError> {
    let status = match optional(fields, "status") {
        Some(v) => Some(
            ProfileStatus::parse(&v)
                .ok_or_else(|| AppError::Validation(format!("invalid status value: {}", v)))?,
        ),
        None => None,
    };
    Ok(ProfilePatch {
        full_name: optional(fields, "fullName"),
        student_number: optional(fields, "studentNumber"),
        degree_program: optional(fields, "degreeProgram"),
        package: optional(fields, "package"),
        payment_status: optional(fields, "paymentStatus")
            .map(|v| parse_payment_status(&v))
            .transpose()?,
        partial_amount: optional(fields, "partialAmount")
            .map(|v| parse_amount(&v))
            .transpose()?,
        payment_date: optional(fields, "paymentDate")
            .map(|v| parse_datetime("paymentDate", &v))
            .transpose()?,
        is_claimed: optional(fields, "isClaimed")
            .map(|v| parse_bool_field("isClaimed", &v))
            .transpose()?,
        claim_date: optional(fields, "claimDate")
            .map(|v| parse_datetime("claimDate", &v))
            .transpose()?,
        claimed_by: optional(fields, "claimedBy"),
        status,
        facebook_account: optional(fields, "facebookAccount"),
        email: optional(fields, "email").map(validate_email).transpose()?,
        picture_url: None,
    })
}

pub async fn create_profile(
    State(state): State<AppState>,
    _user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    let (fields, picture) = read_profile_form(multipart).await?;
    let new = parse_new_profile(&fields)?;
    let mut profile =
        new.into_profile(Uuid::new_v4(), PLACEHOLDER_PICTURE_URL.to_string(), Utc::now())?;

    let store = picture_store(&state);
    if let Some(ref pic) = picture {
        profile.picture_url = store.save(pic).await?;
    }
    match ProfileStore::insert(&state.pool, &profile).await {
        Ok(created) => {
            tracing::info!(id = %created.id, student_number = %created.student_number, "profile created");
            Ok((StatusCode::CREATED, Json(created)))
        }
        Err(e) => {
            if picture.is_some() {
                store.delete_by_url(&profile.picture_url).await;
            }
            Err(e)
        }
    }
}

pub async fn list_profiles(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Profile>>, AppError> {
    let query = ProfileListQuery::from_params(&params)?;
    let profiles = ProfileStore::list(&state.pool, &query).await?;
    Ok(Json(profiles))
}

pub async fn get_profile(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Profile>, AppError> {
    let profile = ProfileStore::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile {}", id)))?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Profile>, AppError> {
    let existing = ProfileStore::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile {}", id)))?;

    let (fields, picture) = read_profile_form(multipart).await?;
    let mut patch = parse_profile_patch(&fields)?;

    let store = picture_store(&state);
    let new_picture_url = match picture {
        Some(ref pic) => {
            let url = store.save(pic).await?;
            patch.picture_url = Some(url.clone());
            Some(url)
        }
        None => None,
    };

    let next = match apply_patch(&existing, patch, Utc::now()) {
        Ok(next) => next,
        Err(e) => {
            if let Some(ref url) = new_picture_url {
                store.delete_by_url(url).await;
            }
            return Err(e);
        }
    };
    let updated = match ProfileStore::update(&state.pool, &next).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(ref url) = new_picture_url {
                store.delete_by_url(url).await;
            }
            return Err(e);
        }
    };
    // The replaced picture only goes away once the row points at the new one.
    if new_picture_url.is_some() {
        store.delete_by_url(&existing.picture_url).await;
    }
    tracing::info!(id = %updated.id, "profile updated");
    Ok(Json(updated))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let existing = ProfileStore::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile {}", id)))?;
    if !ProfileStore::delete(&state.pool, id).await? {
        return Err(AppError::NotFound(format!("profile {}", id)));
    }
    picture_store(&state).delete_by_url(&existing.picture_url).await;
    tracing::info!(id = %id, "profile deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Best-effort bulk delete: ids without a matching profile are skipped.
pub async fn bulk_delete_profiles(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let ids = body
        .get("ids")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::BadRequest("ids must be an array".into()))?;

    let store = picture_store(&state);
    let mut deleted = 0u64;
    for raw in ids {
        let id = raw
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| AppError::BadRequest(format!("invalid profile id: {}", raw)))?;
        if let Some(profile) = ProfileStore::get(&state.pool, id).await? {
            if ProfileStore::delete(&state.pool, id).await? {
                store.delete_by_url(&profile.picture_url).await;
                deleted += 1;
            }
        }
    }
    tracing::info!(requested = ids.len(), deleted, "bulk profile delete");
    Ok(Json(json!({ "message": "Profiles deleted successfully" })))
}
