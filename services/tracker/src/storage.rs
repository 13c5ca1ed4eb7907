//! Object storage collaborator for screenshot bytes
//!
//! Talks to an S3-compatible endpoint (MinIO in the original deployment).
//! Only the object key is handed back to the caller; the database never
//! sees the bytes.

use anyhow::Result;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

/// Object storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket screenshots are written to
    pub bucket: String,
    /// Optional endpoint override for S3-compatible stores
    pub endpoint: Option<String>,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SCREENSHOT_BUCKET`: Target bucket (default: "shiftlog-screenshots")
    /// - `S3_ENDPOINT`: Endpoint URL for S3-compatible stores (optional)
    ///
    /// Credentials and region come from the standard AWS environment.
    pub fn from_env() -> Self {
        let bucket = std::env::var("SCREENSHOT_BUCKET")
            .unwrap_or_else(|_| "shiftlog-screenshots".to_string());
        let endpoint = std::env::var("S3_ENDPOINT").ok();

        StorageConfig { bucket, endpoint }
    }
}

/// Object storage client
#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    endpoint: Option<String>,
}

impl ObjectStorage {
    /// Initialize the S3 client from the environment
    pub async fn from_env() -> Result<Self> {
        let config = StorageConfig::from_env();

        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        Ok(Self {
            client,
            bucket: config.bucket,
            endpoint: config.endpoint,
        })
    }

    /// Make sure the target bucket exists, creating it when absent
    pub async fn ensure_bucket(&self) -> Result<()> {
        let exists = self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok();

        if !exists {
            self.client.create_bucket().bucket(&self.bucket).send().await?;
            info!("Created bucket {}", self.bucket);
        }

        Ok(())
    }

    /// Upload an object
    pub async fn put(&self, key: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes));

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request.send().await?;
        info!("Uploaded object {} to bucket {}", key, self.bucket);
        Ok(())
    }

    /// Public URL for a stored object
    pub fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("s3://{}/{}", self.bucket, key),
        }
    }
}
