//! KatReview Storage Library
//!
//! Storage abstraction for article images and its local filesystem backend.
//!
//! # Storage key format
//!
//! Keys are flat file names inside the public uploads directory and are published
//! as `{UPLOADS_BASE_URL}/{key}`:
//!
//! - staged uploads: `{uuid}-{sanitized original name}`
//! - normalized images: `processed-{uuid}-{sanitized stem}.jpg`
//!
//! Keys must not contain `..`, `/` or `\`. Key generation lives in [`keys`].

pub mod factory;
pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
