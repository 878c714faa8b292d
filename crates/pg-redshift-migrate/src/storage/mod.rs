//! Object storage for export chunks.

use crate::config::StorageConfig;
use crate::error::{MigrateError, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

/// Blob sink for export chunks.
///
/// Puts are independent, unordered, and keyed deterministically, so
/// re-running an export overwrites prior objects instead of orphaning them.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload one object, replacing any existing object under the key.
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()>;

    /// Bucket name, used to build bulk-load object URIs.
    fn bucket(&self) -> &str;
}

/// S3-backed object store with static credentials.
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Create a new S3 store and verify the bucket is reachable.
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "static",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let client = Client::new(&sdk_config);

        client
            .head_bucket()
            .bucket(&config.bucket)
            .send()
            .await
            .map_err(|e| {
                MigrateError::Storage(format!("bucket {} not reachable: {}", config.bucket, e))
            })?;

        info!("Connected to S3 bucket: {}", config.bucket);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        debug!("Uploading {} bytes to s3://{}/{}", body.len(), self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| MigrateError::Storage(format!("put_object {}: {}", key, e)))?;

        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
