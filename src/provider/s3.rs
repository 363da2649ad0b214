//! # S3 Object Store
//!
//! `PutObject` / `DeleteObject` against Amazon S3 or an S3-compatible endpoint.

use crate::crd::ObjectTarget;
use crate::error::CopyError;
use crate::observability::metrics;
use crate::provider::credentials::parse_credentials;
use crate::provider::{ConfigData, ObjectStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, Instrument};

const PROVIDER_NAME: &str = "s3-copy-controller";

/// Connection settings shared by every client the factory builds
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    /// Upper bound on a single S3 operation, retries included
    pub operation_timeout: Option<Duration>,
    /// Custom endpoint (MinIO, LocalStack); enables path-style addressing
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    region: String,
}

impl S3ObjectStore {
    /// Build a client from the credentials document and region in `config`
    ///
    /// Malformed credentials are reported as [`CopyError::Credential`]
    /// before any network traffic happens.
    pub async fn connect(config: &ConfigData, settings: &S3Settings) -> Result<Self, CopyError> {
        let creds = parse_credentials(config.credentials())?;
        let region = config.region().trim();
        if region.is_empty() {
            return Err(CopyError::Credential(
                "cannot build S3 client: target region is empty".to_string(),
            ));
        }

        let credentials = Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.clone(),
            creds.session_token.clone(),
            None,
            PROVIDER_NAME,
        );

        let mut timeouts = TimeoutConfig::builder();
        if let Some(timeout) = settings.operation_timeout {
            timeouts = timeouts.operation_timeout(timeout);
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .timeout_config(timeouts.build());
        if let Some(endpoint) = settings.endpoint_url.as_deref() {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.endpoint_url.is_some())
            .build();

        debug!("Created S3 client for region {}", region);
        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            region: region.to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn store(&self, payload: &[u8], target: &ObjectTarget) -> Result<()> {
        let span = info_span!(
            "s3.object.put",
            bucket = target.bucket.as_str(),
            key = target.key.as_str(),
            region = self.region.as_str()
        );
        let start = Instant::now();

        async move {
            let result = self
                .client
                .put_object()
                .bucket(&target.bucket)
                .key(&target.key)
                .body(ByteStream::from(payload.to_vec()))
                .send()
                .await;

            match result {
                Ok(_) => {
                    metrics::record_backend_operation(
                        "s3",
                        "store",
                        start.elapsed().as_secs_f64(),
                    );
                    info!(
                        "Stored {} bytes at s3://{}/{}",
                        payload.len(),
                        target.bucket,
                        target.key
                    );
                    Ok(())
                }
                Err(e) => {
                    metrics::increment_backend_operation_errors("s3");
                    Err(anyhow::anyhow!("{}", DisplayErrorContext(&e)))
                        .with_context(|| format!("PutObject {}/{}", target.bucket, target.key))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, target: &ObjectTarget) -> Result<()> {
        let span = info_span!(
            "s3.object.delete",
            bucket = target.bucket.as_str(),
            key = target.key.as_str(),
            region = self.region.as_str()
        );
        let start = Instant::now();

        async move {
            // S3 answers 204 for keys that do not exist, so repeats are harmless
            let result = self
                .client
                .delete_object()
                .bucket(&target.bucket)
                .key(&target.key)
                .send()
                .await;

            match result {
                Ok(_) => {
                    metrics::record_backend_operation(
                        "s3",
                        "delete",
                        start.elapsed().as_secs_f64(),
                    );
                    info!("Deleted s3://{}/{}", target.bucket, target.key);
                    Ok(())
                }
                Err(e) => {
                    metrics::increment_backend_operation_errors("s3");
                    Err(anyhow::anyhow!("{}", DisplayErrorContext(&e)))
                        .with_context(|| format!("DeleteObject {}/{}", target.bucket, target.key))
                }
            }
        }
        .instrument(span)
        .await
    }
}
