//! Error types shared across the sales ETL crates

use thiserror::Error;

/// Result type alias for shared-type operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while validating shared domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    #[error("Invalid action '{0}'. Please use action=print or action=insert")]
    InvalidAction(String),

    #[error("Invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: String },
}
