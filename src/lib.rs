//! Togatrack: admin backend for tracking graduation-photo subscribers.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod routes;
pub mod service;
pub mod state;
pub mod upload;

pub use auth::{seed_initial_admin, AuthUser};
pub use config::AppConfig;
pub use error::AppError;
pub use migration::{apply_migrations, ensure_database_exists};
pub use routes::{api_routes, common_routes};
pub use state::AppState;
