//! Sales ETL Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging setup, and error handling for the sales ETL workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`CommonError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber configuration shared by every binary
//! - **Types**: Pipeline actions, source locations, and validated table names
//!
//! # Example
//!
//! ```no_run
//! use sales_common::{Action, TableName};
//!
//! fn target() -> sales_common::Result<(Action, TableName)> {
//!     let action: Action = "insert".parse()?;
//!     let table = TableName::new("analytics.product_sales")?;
//!     Ok((action, table))
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use types::{Action, SourceLocation, TableName};
