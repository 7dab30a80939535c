//! KatReview database layer
//!
//! Postgres repositories over the `categories`, `articles`, `article_images` and
//! `users` tables. Every repository is a cheap `Clone` around a shared `PgPool`.

pub mod db;

use sqlx::migrate::Migrator;

/// Schema migrations from the workspace `migrations/` directory, embedded at
/// build time
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub use db::{
    ArticleImageRepository, ArticleRepository, CategoryRepository, UserRepository,
};
