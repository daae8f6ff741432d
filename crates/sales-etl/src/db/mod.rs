//! Warehouse connection pool and row writer
//!
//! The warehouse speaks the Postgres wire protocol (Postgres or Redshift).
//! One pool is created at startup and shared by every invocation.

use async_trait::async_trait;
use sales_common::TableName;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::pipeline::WarehouseSink;

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type DbResult<T> = Result<T, DbError>;

pub async fn create_pool(config: &DatabaseConfig) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Create the destination tables if they do not exist yet
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> DbResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(DbError::from)
}

/// Build the single-row INSERT for `table`
///
/// `table` is a validated identifier, so interpolating it is safe.
pub fn insert_statement(table: &TableName) -> String {
    format!(
        "INSERT INTO {} (id, total_sales) VALUES ($1, $2::float8)",
        table.as_str()
    )
}

/// [`WarehouseSink`] backed by a Postgres connection pool
#[derive(Clone)]
pub struct PgWarehouse {
    pool: PgPool,
}

impl PgWarehouse {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WarehouseSink for PgWarehouse {
    async fn insert_total(&self, table: &TableName, key: &str, total: f64) -> anyhow::Result<()> {
        sqlx::query(&insert_statement(table))
            .bind(key)
            .bind(total)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        health_check(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_statement() {
        let table = TableName::new("analytics.product_sales").unwrap();
        assert_eq!(
            insert_statement(&table),
            "INSERT INTO analytics.product_sales (id, total_sales) VALUES ($1, $2::float8)"
        );
    }
}
