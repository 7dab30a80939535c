//! Storage setup and initialization

use anyhow::{Context, Result};
use katreview_core::Config;
use katreview_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing uploads storage...");
    let storage = create_storage(config)
        .await
        .with_context(|| format!("Failed to prepare uploads directory {}", config.uploads_dir()))?;
    Ok(storage)
}
