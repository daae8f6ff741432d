//! Common types used across the sales ETL crates

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, Result};

/// Longest identifier Postgres keeps without truncation
const MAX_IDENTIFIER_LEN: usize = 63;

/// Terminal action requested from the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Aggregate and render the totals as text
    Print,
    /// Aggregate and load the totals into the warehouse
    Insert,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Print => "print",
            Action::Insert => "insert",
        }
    }
}

impl std::str::FromStr for Action {
    type Err = CommonError;

    /// Action names are matched exactly; `Print` or ` insert` are rejected.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "print" => Ok(Action::Print),
            "insert" => Ok(Action::Insert),
            other => Err(CommonError::InvalidAction(other.to_string())),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of the sales export in object storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub region: String,
    pub bucket: String,
    pub key: String,
}

impl SourceLocation {
    pub fn new(
        region: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Destination table name, safe to interpolate into SQL
///
/// Accepts `table` or `schema.table`, where each part starts with an ASCII
/// letter or underscore and continues with ASCII letters, digits, or
/// underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: &str| CommonError::InvalidTableName {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name cannot be empty"));
        }

        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() > 2 {
            return Err(invalid("expected 'table' or 'schema.table'"));
        }

        for part in &parts {
            if part.len() > MAX_IDENTIFIER_LEN {
                return Err(invalid("identifier is longer than 63 characters"));
            }

            let mut chars = part.chars();
            match chars.next() {
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
                _ => return Err(invalid("identifier must start with a letter or underscore")),
            }

            if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid(
                    "identifier may only contain letters, digits, and underscores",
                ));
            }
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for TableName {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for TableName {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        TableName::new(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
