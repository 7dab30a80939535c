//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::auth::JwtService;
use crate::state::{AppState, AuthConfig, DbState, MediaState};
use anyhow::{Context, Result};
use katreview_core::Config;
use katreview_processing::{BatchProcessor, ImageNormalizer};
use katreview_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry()
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let state = build_state(config, pool, storage);
    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}

/// Wire repositories, the image pipeline and token service around an existing
/// pool and storage backend.
pub fn build_state(config: Config, pool: PgPool, storage: Arc<dyn Storage>) -> Arc<AppState> {
    let normalizer =
        ImageNormalizer::new(storage.clone(), config.image_max_width(), config.jpeg_quality());

    let media = MediaState {
        storage,
        processor: BatchProcessor::new(normalizer),
        max_images_per_request: config.max_images_per_request(),
        max_file_size: config.max_file_size_bytes(),
        allowed_extensions: config.allowed_extensions().to_vec(),
        allowed_content_types: config.allowed_content_types().to_vec(),
    };

    let auth = AuthConfig {
        jwt: JwtService::new(config.jwt_secret(), config.jwt_expiry_hours()),
        allow_registration: config.allow_registration(),
    };

    Arc::new(AppState {
        db: DbState::new(pool),
        media,
        auth,
        config,
    })
}
