use anyhow::Context;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use mentorserver::api_router::configure_api_routes;
use mentorserver::config::AppConfig;
use mentorserver::shared::state::AppState;
use mentorserver::shared::utils::{create_conn, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let mut conn = pool.get().context("failed to get connection for migrations")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("failed to run migrations: {e}"))?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let pool = create_conn(&config.database_url())?;
    run_migrations(&pool)?;

    let state = Arc::new(AppState {
        conn: pool,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = configure_api_routes(state).layer(cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
