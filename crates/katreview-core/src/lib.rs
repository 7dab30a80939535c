//! KatReview Core Library
//!
//! This crate provides the domain models, error types, configuration and small
//! shared helpers (slugs, password hashing) used by every KatReview component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod password;
pub mod slug;

// Re-export commonly used types
pub use config::{BaseConfig, Config, UploadConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use slug::{slugify, unique_slug};
