use sales_common::SourceLocation;
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack)
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    /// Object key of the sales export
    pub key: String,
    /// Static credentials; when absent the default AWS provider chain is used
    pub access_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl StorageConfig {
    /// Reads `S3_*` variables, falling back to the bare `REGION`, `BUCKET`
    /// and `KEY` names used by older deployments.
    pub fn from_env() -> anyhow::Result<Self> {
        let bucket = env::var("S3_BUCKET")
            .or_else(|_| env::var("BUCKET"))
            .map_err(|_| anyhow::anyhow!("S3_BUCKET (or BUCKET) must be set"))?;
        let key = env::var("S3_KEY")
            .or_else(|_| env::var("KEY"))
            .map_err(|_| anyhow::anyhow!("S3_KEY (or KEY) must be set"))?;

        Ok(Self {
            endpoint: env::var("S3_ENDPOINT").ok(),
            region: env::var("S3_REGION")
                .or_else(|_| env::var("REGION"))
                .unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            bucket,
            key,
            access_key: env::var("S3_ACCESS_KEY").ok(),
            secret_key: env::var("S3_SECRET_KEY").ok(),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        })
    }

    pub fn for_minio(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: DEFAULT_REGION.to_string(),
            bucket: bucket.into(),
            key: key.into(),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            path_style: true,
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(&self.region, &self.bucket, &self.key)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bucket.is_empty() {
            anyhow::bail!("S3 bucket cannot be empty");
        }
        if self.key.is_empty() {
            anyhow::bail!("S3 object key cannot be empty");
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            anyhow::bail!("S3_ACCESS_KEY and S3_SECRET_KEY must be set together");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 10] = [
        "S3_BUCKET", "BUCKET", "S3_KEY", "KEY", "S3_REGION", "REGION", "S3_ENDPOINT",
        "S3_ACCESS_KEY", "S3_SECRET_KEY", "S3_PATH_STYLE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_for_minio() {
        let config = StorageConfig::for_minio("http://localhost:9000", "exports", "sales.csv");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.location().to_string(), "s3://exports/sales.csv");
        assert!(config.path_style);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_uses_legacy_names() {
        clear_env();
        env::set_var("REGION", "eu-central-1");
        env::set_var("BUCKET", "legacy-bucket");
        env::set_var("KEY", "data/sales.csv");

        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.region, "eu-central-1");
        assert_eq!(config.bucket, "legacy-bucket");
        assert_eq!(config.key, "data/sales.csv");
        assert!(config.access_key.is_none());
        assert!(!config.path_style);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_prefers_prefixed_names() {
        clear_env();
        env::set_var("BUCKET", "legacy-bucket");
        env::set_var("S3_BUCKET", "new-bucket");
        env::set_var("S3_KEY", "sales.csv");

        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.bucket, "new-bucket");
        assert_eq!(config.region, DEFAULT_REGION);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_requires_bucket() {
        clear_env();
        env::set_var("S3_KEY", "sales.csv");
        assert!(StorageConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_validate_rejects_half_credentials() {
        let mut config = StorageConfig::for_minio("http://localhost:9000", "b", "k");
        config.secret_key = None;
        assert!(config.validate().is_err());
    }
}
