use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_s3::{
    config::{Credentials, Region},
    presigning::PresigningConfig,
    Client,
};
use shared_types::AppError;

/// Default presign expiry (15 minutes).
const PRESIGN_EXPIRY_SECS: u64 = 900;

/// Read an env var, trying the primary name first then a fallback.
pub fn env_or(primary: &str, fallback: &str) -> Option<String> {
    let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    read(primary).or_else(|| read(fallback))
}

fn attachments_bucket() -> String {
    env_or("ATTACHMENTS_BUCKET", "S3_BUCKET").unwrap_or_else(|| "request-attachments".to_string())
}

/// Object storage operations for request attachments.
#[allow(async_fn_in_trait)]
pub trait ObjectStore: Send + Sync {
    /// Generate a presigned PUT URL. Returns (url, required_headers).
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<(String, HashMap<String, String>), String>;

    /// Generate a presigned GET URL for downloading.
    async fn presign_get(&self, key: &str) -> Result<String, String>;

    async fn delete(&self, key: &str) -> Result<(), String>;
}

/// S3-compatible object store (AWS, MinIO, Tigris).
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a store from environment variables.
    ///
    /// Supports both `AWS_*` and local `S3_*` naming:
    ///   - `AWS_ENDPOINT_URL_S3` / `S3_ENDPOINT`
    ///   - `AWS_ACCESS_KEY_ID`   / `S3_ACCESS_KEY`
    ///   - `AWS_SECRET_ACCESS_KEY` / `S3_SECRET_KEY`
    ///   - `AWS_REGION`          / `S3_REGION`
    pub fn from_env() -> Result<Self, AppError> {
        let missing = |name: &str| {
            tracing::error!("{name} is not configured");
            AppError::internal("Object storage is not configured")
        };
        let endpoint = env_or("AWS_ENDPOINT_URL_S3", "S3_ENDPOINT")
            .ok_or_else(|| missing("AWS_ENDPOINT_URL_S3"))?;
        let access_key = env_or("AWS_ACCESS_KEY_ID", "S3_ACCESS_KEY")
            .ok_or_else(|| missing("AWS_ACCESS_KEY_ID"))?;
        let secret_key = env_or("AWS_SECRET_ACCESS_KEY", "S3_SECRET_KEY")
            .ok_or_else(|| missing("AWS_SECRET_ACCESS_KEY"))?;
        let region = env_or("AWS_REGION", "S3_REGION").unwrap_or_else(|| "me-central-1".to_string());

        let creds = Credentials::new(&access_key, &secret_key, None, None, "env");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(&endpoint)
            .region(Region::new(region))
            .credentials_provider(creds)
            .force_path_style(true)
            .behavior_version_latest()
            .build();

        Ok(Self {
            client: Client::from_conf(config),
            bucket: attachments_bucket(),
        })
    }

    /// Ensure the attachments bucket exists (no public-read policy).
    pub async fn ensure_bucket(&self) {
        let exists = self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok();

        if !exists {
            tracing::info!(bucket = %self.bucket, "Creating attachments bucket");
            if let Err(e) = self.client.create_bucket().bucket(&self.bucket).send().await {
                tracing::warn!(bucket = %self.bucket, error = %e, "Failed to create attachments bucket");
            }
        }
    }
}

impl ObjectStore for S3ObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<(String, HashMap<String, String>), String> {
        let presign_config = PresigningConfig::builder()
            .expires_in(Duration::from_secs(PRESIGN_EXPIRY_SECS))
            .build()
            .map_err(|e| format!("Presign config error: {}", e))?;

        // SSE is sent as a required unsigned header; signing it breaks some
        // S3-compatible backends.
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presign_config)
            .await
            .map_err(|e| format!("Presign PUT failed: {}", e))?;

        let mut required_headers = HashMap::new();
        required_headers.insert("Content-Type".to_string(), content_type.to_string());
        required_headers.insert(
            "x-amz-server-side-encryption".to_string(),
            "AES256".to_string(),
        );

        Ok((presigned.uri().to_string(), required_headers))
    }

    async fn presign_get(&self, key: &str) -> Result<String, String> {
        let presign_config = PresigningConfig::builder()
            .expires_in(Duration::from_secs(PRESIGN_EXPIRY_SECS))
            .build()
            .map_err(|e| format!("Presign config error: {}", e))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| format!("Presign GET failed: {}", e))?;

        Ok(presigned.uri().to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| format!("DELETE failed: {}", e))?;
        Ok(())
    }
}
