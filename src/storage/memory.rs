use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ObjectStorage, StorageError};

/// In-process object store for development and tests
#[derive(Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn upload(&self, key: &str, body: Vec<u8>, _content_type: &str) -> Result<String, StorageError> {
        self.objects.write().await.insert(key.to_string(), body);
        Ok(key.to_string())
    }

    async fn presigned_url(&self, key: &str) -> Result<String, StorageError> {
        Ok(format!("http://localhost/storage/{}?signature=memory", key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}
