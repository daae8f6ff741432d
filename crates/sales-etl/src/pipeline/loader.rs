//! Warehouse loader
//!
//! Writes an aggregate into its destination table, one INSERT per key. Each
//! key is an independent attempt; what happens after a failed key is decided
//! by [`LoadPolicy`].

use std::sync::Arc;

use async_trait::async_trait;
use sales_common::TableName;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::aggregate::SalesAggregate;
use super::error::LoadError;

/// Row-level write access to the warehouse
#[async_trait]
pub trait WarehouseSink: Send + Sync {
    /// Insert one `(id, total_sales)` row
    async fn insert_total(&self, table: &TableName, key: &str, total: f64) -> anyhow::Result<()>;

    /// Check that the warehouse is reachable
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// What to do after a key fails to insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPolicy {
    /// Attempt every key of every table and report all failures together
    #[default]
    Continue,
    /// Stop at the first failed key
    FailFast,
}

impl std::str::FromStr for LoadPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continue" | "collect" => Ok(LoadPolicy::Continue),
            "fail-fast" | "fail_fast" | "failfast" => Ok(LoadPolicy::FailFast),
            _ => Err(anyhow::anyhow!("Invalid load policy: {}", s)),
        }
    }
}

impl std::fmt::Display for LoadPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadPolicy::Continue => write!(f, "continue"),
            LoadPolicy::FailFast => write!(f, "fail-fast"),
        }
    }
}

/// Outcome of loading one aggregate into one table
#[derive(Debug, Clone, PartialEq)]
pub struct TableLoad {
    pub table: TableName,
    pub attempted: usize,
    pub inserted: usize,
    pub failures: Vec<LoadError>,
}

impl TableLoad {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone)]
pub struct Loader {
    sink: Arc<dyn WarehouseSink>,
    policy: LoadPolicy,
}

impl Loader {
    pub fn new(sink: Arc<dyn WarehouseSink>, policy: LoadPolicy) -> Self {
        Self { sink, policy }
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    pub fn sink(&self) -> &Arc<dyn WarehouseSink> {
        &self.sink
    }

    #[instrument(skip(self, aggregate), fields(table = %table, keys = aggregate.len(), policy = %self.policy))]
    pub async fn load(&self, table: &TableName, aggregate: &SalesAggregate) -> TableLoad {
        let mut outcome = TableLoad {
            table: table.clone(),
            attempted: 0,
            inserted: 0,
            failures: Vec::new(),
        };

        for (key, total) in aggregate.iter() {
            outcome.attempted += 1;

            match self.sink.insert_total(table, key, total).await {
                Ok(()) => {
                    outcome.inserted += 1;
                    debug!(key, total, "Inserted row");
                },
                Err(e) => {
                    let failure = LoadError {
                        table: table.clone(),
                        key: key.to_string(),
                        message: format!("{:#}", e),
                    };
                    error!(key, error = %failure.message, "Failed to insert row");
                    outcome.failures.push(failure);

                    if self.policy == LoadPolicy::FailFast {
                        break;
                    }
                },
            }
        }

        info!(
            attempted = outcome.attempted,
            inserted = outcome.inserted,
            failed = outcome.failures.len(),
            "Loaded {}",
            table
        );

        outcome
    }
}
