//! Pipeline error taxonomy

use sales_common::{SourceLocation, TableName};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fatal outcome of one pipeline invocation
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Error reading CSV from {location}: {message}")]
    Retrieval {
        location: SourceLocation,
        message: String,
    },

    #[error("Error parsing CSV at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Invalid action '{0}' specified. Please use action=print or action=insert")]
    InvalidAction(String),

    #[error("{}", describe_load_failures(.failures, .inserted))]
    Load {
        failures: Vec<LoadError>,
        inserted: usize,
    },
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let message = match err.kind() {
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => format!("expected {} fields, found {}", expected_len, len),
            csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8: {}", err),
            _ => err.to_string(),
        };
        PipelineError::Parse { line, message }
    }
}

/// A single key that could not be written to the warehouse
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to insert {key} into {table}: {message}")]
pub struct LoadError {
    pub table: TableName,
    pub key: String,
    pub message: String,
}

/// A source row excluded from aggregation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: invalid {field} '{value}': {reason}")]
pub struct RowValidationError {
    pub line: u64,
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

fn describe_load_failures(failures: &[LoadError], inserted: &usize) -> String {
    let mut message = format!(
        "Error inserting sales data: {} row(s) failed, {} inserted",
        failures.len(),
        inserted
    );
    for failure in failures {
        message.push_str("\n  ");
        message.push_str(&failure.to_string());
    }
    message
}
