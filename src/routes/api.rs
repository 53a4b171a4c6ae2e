//! API routes: auth, profile CRUD (+ bulk delete), remark CRUD.
//!
//! Mounted under `/api`. Multipart uploads go through the same router, so the
//! default body limit is replaced by one sized for the picture cap.

use crate::handlers::auth::{login, validate};
use crate::handlers::profile::{
    bulk_delete_profiles, create_profile, delete_profile, get_profile, list_profiles,
    update_profile,
};
use crate::handlers::remark::{create_remark, delete_remark, list_remarks, update_remark};
use crate::state::AppState;
use crate::upload::MAX_PICTURE_BYTES;
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

/// Headroom for the multipart framing and text fields around the picture.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/validate", get(validate))
        .route("/profiles", get(list_profiles).post(create_profile))
        .route("/profiles/bulk", delete(bulk_delete_profiles))
        .route(
            "/profiles/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/remarks", post(create_remark))
        // GET takes a profile id, PUT/DELETE take a remark id.
        .route(
            "/remarks/:id",
            get(list_remarks).put(update_remark).delete(delete_remark),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_PICTURE_BYTES + BODY_LIMIT_SLACK))
        .with_state(state)
}
