//! S3-compatible object storage client
//!
//! Read-only access to the bucket holding the sales export.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    Client,
};
use sales_common::SourceLocation;
use tracing::{debug, info, instrument};

use crate::pipeline::ObjectStore;

pub mod config;

#[derive(Clone)]
pub struct Storage {
    client: Client,
}

impl Storage {
    pub async fn new(config: &config::StorageConfig) -> Result<Self> {
        debug!("Initializing storage with config: {:?}", config);

        let mut builder = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "sales-etl-storage",
                ))
                .region(Region::new(config.region.clone())),
            _ => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            },
        };

        builder = builder.force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());

        info!(region = %config.region, bucket = %config.bucket, "Storage client initialized");

        Ok(Self { client })
    }

    #[instrument(skip(self), fields(location = %location))]
    pub async fn download(&self, location: &SourceLocation) -> Result<Vec<u8>> {
        debug!("Downloading {}", location);

        let response = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(e)))
            .with_context(|| format!("Failed to download {}", location))?;

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read S3 response body")?
            .into_bytes()
            .to_vec();

        debug!(bytes = data.len(), "Downloaded {}", location);

        Ok(data)
    }
}

#[async_trait]
impl ObjectStore for Storage {
    async fn fetch(&self, location: &SourceLocation) -> Result<Vec<u8>> {
        self.download(location).await
    }
}
