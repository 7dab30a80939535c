//! Storage double that can be told to refuse normalized output.

use async_trait::async_trait;
use katreview_core::constants::PROCESSED_PREFIX;
use katreview_storage::{LocalStorage, Storage, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Local storage whose writes of `processed-` keys fail while the switch is on
pub struct SwitchableStorage {
    inner: LocalStorage,
    fail_processed: Arc<AtomicBool>,
}

impl SwitchableStorage {
    pub fn new(inner: LocalStorage, fail_processed: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            fail_processed,
        }
    }
}

#[async_trait]
impl Storage for SwitchableStorage {
    async fn upload_with_key(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        if key.starts_with(PROCESSED_PREFIX) && self.fail_processed.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("disk full".to_string()));
        }
        self.inner.upload_with_key(key, data, content_type).await
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.inner.download(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    fn url_for(&self, key: &str) -> String {
        self.inner.url_for(key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        self.inner.key_for_url(url)
    }
}
