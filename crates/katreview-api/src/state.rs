//! Application state and sub-state extractors.
//!
//! Handlers extract only the sub-state they need through Axum's `FromRef`.

use crate::auth::jwt::JwtService;
use katreview_core::Config;
use katreview_db::{ArticleImageRepository, ArticleRepository, CategoryRepository, UserRepository};
use katreview_processing::BatchProcessor;
use katreview_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Database pool and repositories
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub categories: CategoryRepository,
    pub articles: ArticleRepository,
    pub images: ArticleImageRepository,
    pub users: UserRepository,
}

impl DbState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            categories: CategoryRepository::new(pool.clone()),
            articles: ArticleRepository::new(pool.clone()),
            images: ArticleImageRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Uploads storage, the image pipeline and upload limits
#[derive(Clone)]
pub struct MediaState {
    pub storage: Arc<dyn Storage>,
    pub processor: BatchProcessor,
    pub max_images_per_request: usize,
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

/// Token issuing and registration policy
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt: JwtService,
    pub allow_registration: bool,
}

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub media: MediaState,
    pub auth: AuthConfig,
    pub config: Config,
}

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for MediaState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.media.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for AuthConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.auth.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
