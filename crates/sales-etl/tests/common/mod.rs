//! Shared fixtures for the integration tests
//!
//! In-memory stand-ins for the object store and the warehouse so the whole
//! pipeline can run without S3 or Postgres.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sales_common::{SourceLocation, TableName};
use sales_etl::pipeline::{
    LoadPolicy, Loader, ObjectStore, Pipeline, PipelineConfig, RecordSource, RowSchema,
    WarehouseSink,
};

pub const WORKED_EXAMPLE: &str = "\
order_id,product_id,product_name,quantity,discount,unit_price,channel,country
1,P1,Widget,2,0,10.0,web,US
2,P1,Widget,3,0,10.0,store,CA
";

pub fn location() -> SourceLocation {
    SourceLocation::new("us-east-1", "exports", "sales.csv")
}

pub fn product_table() -> TableName {
    TableName::new("product_sales").unwrap()
}

pub fn country_table() -> TableName {
    TableName::new("country_sales").unwrap()
}

/// Object store serving one fixed body, or failing every fetch
pub struct MemoryStore {
    body: Result<Vec<u8>, String>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn with_body(body: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            body: Ok(body.into()),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            body: Err(message.to_string()),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn fetch(&self, _location: &SourceLocation) -> anyhow::Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.body.clone().map_err(|e| anyhow::anyhow!(e))
    }
}

/// Warehouse recording every inserted row
///
/// Inserts for keys listed in `reject` fail; `ping` fails when `reachable`
/// is false.
#[derive(Default)]
pub struct MemoryWarehouse {
    rows: Mutex<Vec<(String, String, f64)>>,
    attempts: AtomicUsize,
    reject: HashSet<String>,
    unreachable: bool,
}

impl MemoryWarehouse {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting(keys: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            reject: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            unreachable: true,
            ..Self::default()
        })
    }

    /// Rows written so far as `(table, key, total)`
    pub fn rows(&self) -> Vec<(String, String, f64)> {
        self.rows.lock().unwrap().clone()
    }

    pub fn rows_in(&self, table: &str) -> Vec<(String, f64)> {
        self.rows()
            .into_iter()
            .filter(|(t, _, _)| t == table)
            .map(|(_, key, total)| (key, total))
            .collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WarehouseSink for MemoryWarehouse {
    async fn insert_total(&self, table: &TableName, key: &str, total: f64) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.reject.contains(key) {
            anyhow::bail!("duplicate key value violates unique constraint");
        }
        self.rows
            .lock()
            .unwrap()
            .push((table.to_string(), key.to_string(), total));
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        if self.unreachable {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }
}

pub fn pipeline(
    store: Arc<MemoryStore>,
    warehouse: Arc<MemoryWarehouse>,
    policy: LoadPolicy,
) -> Pipeline {
    let source = RecordSource::new(store, location(), true);
    let loader = Loader::new(warehouse, policy);
    Pipeline::new(
        source,
        loader,
        PipelineConfig {
            schema: RowSchema::default(),
            product_table: product_table(),
            country_table: country_table(),
        },
    )
}
