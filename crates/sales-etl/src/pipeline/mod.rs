//! Sales aggregation pipeline
//!
//! - [`source`]: fetch the CSV export and split it into records
//! - [`record`]: typed decoding of the business fields of one record
//! - [`aggregate`]: per-product and per-country totals
//! - [`loader`]: one INSERT per aggregate key, with an explicit failure policy
//! - [`orchestrator`]: runs the steps above for a `print` or `insert` action

pub mod aggregate;
pub mod error;
pub mod loader;
pub mod orchestrator;
pub mod record;
pub mod report;
pub mod source;

pub use aggregate::{aggregate, Aggregation, SalesAggregate};
pub use error::{LoadError, PipelineError, Result, RowValidationError};
pub use loader::{LoadPolicy, Loader, TableLoad, WarehouseSink};
pub use orchestrator::{Pipeline, PipelineConfig};
pub use record::{RowSchema, SaleRow};
pub use report::RunReport;
pub use source::{parse_records, ObjectStore, RecordSource, SourceRow, SourceRows};
