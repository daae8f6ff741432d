//! Configuration management

use sales_common::TableName;
use serde::{Deserialize, Serialize};

use crate::pipeline::{LoadPolicy, PipelineConfig, RowSchema};
use crate::storage::config::StorageConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 1;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default destination table for per-product totals.
pub const DEFAULT_PRODUCT_TABLE: &str = "product_sales";

/// Default destination table for per-country totals.
pub const DEFAULT_COUNTRY_TABLE: &str = "country_sales";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    pub warehouse: WarehouseConfig,
}

/// HTTP trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Warehouse connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Apply bundled migrations at startup
    pub run_migrations: bool,
}

/// Sales export location and layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub storage: StorageConfig,
    /// Whether the first CSV record is a header
    pub has_header: bool,
}

/// Destination tables and failure policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub product_table: TableName,
    pub country_table: TableName,
    pub load_policy: LoadPolicy,
}

impl Config {
    /// Load configuration from environment (and `.env`) and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("SALES_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("SALES_PORT", DEFAULT_SERVER_PORT),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .or_else(|_| std::env::var("REDSHIFT_CONN_STRING"))
                    .map_err(|_| {
                        anyhow::anyhow!("DATABASE_URL (or REDSHIFT_CONN_STRING) must be set")
                    })?,
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
                run_migrations: env_or("RUN_MIGRATIONS", false),
            },
            source: SourceConfig {
                storage: StorageConfig::from_env()?,
                has_header: env_or("SOURCE_HAS_HEADER", true),
            },
            warehouse: WarehouseConfig {
                product_table: TableName::new(
                    std::env::var("PRODUCT_SALES_TABLE")
                        .unwrap_or_else(|_| DEFAULT_PRODUCT_TABLE.to_string()),
                )?,
                country_table: TableName::new(
                    std::env::var("COUNTRY_SALES_TABLE")
                        .unwrap_or_else(|_| DEFAULT_COUNTRY_TABLE.to_string()),
                )?,
                load_policy: match std::env::var("LOAD_POLICY") {
                    Ok(policy) => policy.parse()?,
                    Err(_) => LoadPolicy::default(),
                },
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.warehouse.product_table == self.warehouse.country_table {
            anyhow::bail!(
                "Product and country totals cannot share table '{}'",
                self.warehouse.product_table
            );
        }

        self.source.storage.validate()?;

        Ok(())
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            schema: RowSchema::default(),
            product_table: self.warehouse.product_table.clone(),
            country_table: self.warehouse.country_table.clone(),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config() -> Config {
        Config {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/sales".to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                run_migrations: false,
            },
            source: SourceConfig {
                storage: StorageConfig::for_minio("http://localhost:9000", "exports", "sales.csv"),
                has_header: true,
            },
            warehouse: WarehouseConfig {
                product_table: TableName::new(DEFAULT_PRODUCT_TABLE).unwrap(),
                country_table: TableName::new(DEFAULT_COUNTRY_TABLE).unwrap(),
                load_policy: LoadPolicy::Continue,
            },
        }
    }

    const VARS: [&str; 12] = [
        "DATABASE_URL", "REDSHIFT_CONN_STRING", "S3_BUCKET", "S3_KEY", "BUCKET", "KEY",
        "SALES_PORT", "LOAD_POLICY", "PRODUCT_SALES_TABLE", "COUNTRY_SALES_TABLE",
        "SOURCE_HAS_HEADER", "RUN_MIGRATIONS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_pool_sizes() {
        let mut cfg = config();
        cfg.database.min_connections = 20;
        assert!(cfg.validate().is_err());

        cfg.database.max_connections = 0;
        cfg.database.min_connections = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_table() {
        let mut cfg = config();
        cfg.warehouse.country_table = cfg.warehouse.product_table.clone();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_pipeline_config_uses_default_layout() {
        let pipeline = config().pipeline();
        assert_eq!(pipeline.schema, RowSchema::default());
        assert_eq!(pipeline.product_table.as_str(), "product_sales");
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        clear_env();
        std::env::set_var("REDSHIFT_CONN_STRING", "postgresql://warehouse/sales");
        std::env::set_var("BUCKET", "exports");
        std::env::set_var("KEY", "sales.csv");
        std::env::set_var("SALES_PORT", "9090");
        std::env::set_var("LOAD_POLICY", "fail-fast");
        std::env::set_var("PRODUCT_SALES_TABLE", "analytics.products");
        std::env::set_var("SOURCE_HAS_HEADER", "false");

        let cfg = Config::load().unwrap();
        assert_eq!(cfg.database.url, "postgresql://warehouse/sales");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.warehouse.load_policy, LoadPolicy::FailFast);
        assert_eq!(cfg.warehouse.product_table.as_str(), "analytics.products");
        assert_eq!(cfg.warehouse.country_table.as_str(), DEFAULT_COUNTRY_TABLE);
        assert!(!cfg.source.has_header);
        assert!(!cfg.database.run_migrations);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_rejects_unsafe_table_name() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgresql://localhost/sales");
        std::env::set_var("S3_BUCKET", "exports");
        std::env::set_var("S3_KEY", "sales.csv");
        std::env::set_var("COUNTRY_SALES_TABLE", "country_sales; DROP TABLE x");

        assert!(Config::load().is_err());

        clear_env();
    }
}
