use anyhow::{Context, Result};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

use crate::shared::error::ApiError;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_conn(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .context("failed to create database connection pool")
}

/// Runs a diesel closure on the blocking pool with a pooled connection.
/// All handler queries go through here.
pub async fn with_conn<T, F>(pool: &DbPool, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| {
            log::error!("failed to get database connection: {}", e);
            ApiError::Internal
        })?;
        f(&mut conn)
    })
    .await
    .map_err(|e| {
        log::error!("blocking task panicked: {}", e);
        ApiError::Internal
    })?
}
