//! Pipeline orchestrator
//!
//! Sequences Source -> Aggregator -> Loader for one requested action:
//!
//! 1. Validate the action (nothing is fetched for an unknown action)
//! 2. Read the export
//! 3. Aggregate by product and by country
//! 4. For `insert`, load the product table and then the country table

use chrono::Utc;
use sales_common::{Action, TableName};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::aggregate::{aggregate, SalesAggregate};
use super::error::{PipelineError, Result};
use super::loader::{LoadPolicy, Loader, TableLoad};
use super::record::RowSchema;
use super::report::RunReport;
use super::source::RecordSource;

/// Destination tables and row layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub schema: RowSchema,
    pub product_table: TableName,
    pub country_table: TableName,
}

/// The ingest -> aggregate -> load pipeline
///
/// Holds no per-run state, so one instance can serve concurrent invocations.
#[derive(Clone)]
pub struct Pipeline {
    source: RecordSource,
    loader: Loader,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(source: RecordSource, loader: Loader, config: PipelineConfig) -> Self {
        Self {
            source,
            loader,
            config,
        }
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Run the action named by `action`
    pub async fn run(&self, action: &str) -> Result<RunReport> {
        let action: Action = action
            .parse()
            .map_err(|_| PipelineError::InvalidAction(action.to_string()))?;
        self.execute(action).await
    }

    pub async fn execute(&self, action: Action) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id, %action);
        self.execute_inner(run_id, action).instrument(span).await
    }

    async fn execute_inner(&self, run_id: Uuid, action: Action) -> Result<RunReport> {
        let started_at = Utc::now();
        info!(source = %self.source.location(), "Starting pipeline run");

        let rows = self.source.read().await?;
        let aggregation = aggregate(&rows.rows, &self.config.schema);

        let loads = match action {
            Action::Print => Vec::new(),
            Action::Insert => {
                self.load(&aggregation.by_product, &aggregation.by_country)
                    .await?
            },
        };

        let report = RunReport {
            run_id,
            action,
            started_at,
            finished_at: Utc::now(),
            rows_read: rows.rows.len(),
            rows_accepted: aggregation.accepted,
            rows_rejected: aggregation.rejected.len(),
            product_sales: aggregation.by_product,
            country_sales: aggregation.by_country,
            loads,
        };

        info!(
            rows_read = report.rows_read,
            rows_rejected = report.rows_rejected,
            inserted = report.inserted(),
            "Pipeline run completed"
        );

        Ok(report)
    }

    /// Product table first, then country table
    async fn load(
        &self,
        by_product: &SalesAggregate,
        by_country: &SalesAggregate,
    ) -> Result<Vec<TableLoad>> {
        let mut loads = Vec::with_capacity(2);

        let product = self.loader.load(&self.config.product_table, by_product).await;
        let stop = !product.is_complete() && self.loader.policy() == LoadPolicy::FailFast;
        loads.push(product);

        if !stop {
            loads.push(self.loader.load(&self.config.country_table, by_country).await);
        }

        let failures: Vec<_> = loads.iter().flat_map(|l| l.failures.iter().cloned()).collect();
        if !failures.is_empty() {
            return Err(PipelineError::Load {
                failures,
                inserted: loads.iter().map(|l| l.inserted).sum(),
            });
        }

        Ok(loads)
    }
}
