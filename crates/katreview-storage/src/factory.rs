use crate::{LocalStorage, Storage, StorageResult};
use katreview_core::Config;
use std::sync::Arc;

/// Create the uploads storage from configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(
        config.uploads_dir(),
        config.uploads_base_url().to_string(),
    )
    .await?;

    tracing::info!(
        path = %storage.base_path().display(),
        base_url = %config.uploads_base_url(),
        "Uploads storage ready"
    );

    Ok(Arc::new(storage))
}
