use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Creates a lazily connecting pool to the Postgres database
pub fn get_db_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(20)
        .idle_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy(database_url)
        .context("Failed to parse DATABASE_URL")
}

/// Server version string, used to prove the database is reachable.
pub async fn database_version(pool: &PgPool) -> Result<String> {
    sqlx::query_scalar::<_, String>("SELECT version()")
        .fetch_one(pool)
        .await
        .context("Failed to query Postgres version")
}
