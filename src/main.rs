//! Server binary: env config, pool, migrations, admin seeding, routers.

use axum::Router;
use std::sync::Arc;
use togatrack::upload::PictureStore;
use togatrack::{
    api_routes, apply_migrations, common_routes, ensure_database_exists, seed_initial_admin,
    AppConfig, AppState,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("togatrack=info".parse()?))
        .init();

    let config = AppConfig::from_env()?;

    ensure_database_exists(&config.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    apply_migrations(&pool).await?;
    seed_initial_admin(&pool, &config.admin_username, &config.admin_password).await?;

    PictureStore::new(&config.uploads_dir, &config.public_base_url)
        .ensure_dir()
        .await?;

    let state = AppState {
        pool,
        config: Arc::new(config),
    };

    let app = Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state.clone()))
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = TcpListener::bind(state.config.bind_addr.as_str()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
