use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    config::Credentials,
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client,
};
use tracing::{debug, info};

use super::{ObjectStorage, StorageError};
use crate::config::StorageConfig;

pub struct S3Storage {
    client: Client,
    bucket: String,
    presign_expiry: Duration,
}

impl S3Storage {
    /// Build a client for `bucket`. Static keys from config win over the default credential chain.
    pub async fn from_config(config: &StorageConfig, bucket: &str) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(key_id, secret, None, None, "boogie-env"));
        }

        let sdk_config = loader.load().await;
        info!("Using S3 bucket {} in {}", bucket, config.region);

        Self {
            client: Client::new(&sdk_config),
            bucket: bucket.to_string(),
            presign_expiry: Duration::from_secs(config.presigned_url_secs),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().map(|e| e.is_not_found()).unwrap_or(false) {
                    return Ok(false);
                }
                Err(StorageError::Backend(format!("head {}: {}", key, err)))
            }
        }
    }

    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("put {}: {}", key, e)))?;

        debug!("Uploaded {} to {}", key, self.bucket);
        Ok(key.to_string())
    }

    async fn presigned_url(&self, key: &str) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(self.presign_expiry)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Backend(format!("presign {}: {}", key, e)))?;

        Ok(request.uri().to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("delete {}: {}", key, e)))?;

        debug!("Deleted {} from {}", key, self.bucket);
        Ok(())
    }
}
