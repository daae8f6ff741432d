//! Sales ETL Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Fetches a CSV sales export from S3, totals it by product and by country,
//! and loads the totals into a Postgres-protocol warehouse.
//!
//! # Overview
//!
//! - **Pipeline**: record source, aggregator, loader, and orchestrator
//! - **Storage**: S3-compatible object store client
//! - **Database**: connection pool and row writer for the warehouse
//! - **API**: axum router exposing the pipeline over HTTP
//! - **Configuration**: environment-based configuration management
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sales_etl::{config::Config, db, pipeline::*, storage::Storage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let storage = Storage::new(&config.source.storage).await?;
//!
//!     let source = RecordSource::new(
//!         Arc::new(storage),
//!         config.source.storage.location(),
//!         config.source.has_header,
//!     );
//!     let loader = Loader::new(Arc::new(db::PgWarehouse::new(pool)), config.warehouse.load_policy);
//!     let pipeline = Pipeline::new(source, loader, config.pipeline());
//!
//!     println!("{}", pipeline.run("print").await?.render());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod pipeline;
pub mod storage;

// Re-export commonly used types
pub use pipeline::{Pipeline, PipelineError, RunReport};
