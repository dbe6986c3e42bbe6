pub mod resize;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory::MemoryStorage;
pub use self::s3::S3Storage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage request failed: {0}")]
    Backend(String),

    #[error("{0}")]
    InvalidImage(String),

    #[error("image task failed: {0}")]
    Task(String),
}

/// Key/value object store holding uploaded images
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, StorageError>;

    /// Time-limited GET URL; does not check that the object exists
    async fn presigned_url(&self, key: &str) -> Result<String, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Presigned URL for an existing object, `None` for an empty or missing key
    async fn object_url(&self, key: &str) -> Result<Option<String>, StorageError> {
        if key.is_empty() || !self.exists(key).await? {
            return Ok(None);
        }
        self.presigned_url(key).await.map(Some)
    }

    /// Object URL with the signature query removed, for public-read prefixes
    async fn public_url(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.object_url(key).await?.map(|url| strip_query(&url)))
    }

    /// Delete the object when it exists; returns whether anything was removed
    async fn delete_if_exists(&self, key: &str) -> Result<bool, StorageError> {
        if key.is_empty() || !self.exists(key).await? {
            return Ok(false);
        }
        self.delete(key).await?;
        Ok(true)
    }
}

pub fn strip_query(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.into()
        }
        Err(_) => raw.split('?').next().unwrap_or(raw).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_signature_query() {
        let url = "https://bucket.s3.ap-northeast-2.amazonaws.com/banner/a.png?X-Amz-Signature=abc&X-Amz-Expires=900";
        assert_eq!(strip_query(url), "https://bucket.s3.ap-northeast-2.amazonaws.com/banner/a.png");
    }

    #[test]
    fn strips_query_from_unparseable_url() {
        assert_eq!(strip_query("banner/a.png?sig=1"), "banner/a.png");
    }

    #[tokio::test]
    async fn object_url_is_none_for_missing_objects() {
        let storage = MemoryStorage::new();
        assert!(storage.object_url("missing").await.unwrap().is_none());
        assert!(storage.object_url("").await.unwrap().is_none());

        storage.upload("banner/a.png", vec![1, 2, 3], "image/png").await.unwrap();
        let url = storage.public_url("banner/a.png").await.unwrap().unwrap();
        assert!(url.ends_with("/banner/a.png"));
        assert!(!url.contains('?'));
    }

    #[tokio::test]
    async fn delete_if_exists_reports_removal() {
        let storage = MemoryStorage::new();
        storage.upload("k", vec![0], "image/png").await.unwrap();
        assert!(storage.delete_if_exists("k").await.unwrap());
        assert!(!storage.delete_if_exists("k").await.unwrap());
    }
}
