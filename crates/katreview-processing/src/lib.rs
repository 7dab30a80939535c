//! KatReview image pipeline
//!
//! - [`normalizer`]: decode, cover-fit to 3:2 and re-encode one uploaded image
//! - [`batch`]: run the normalizer over an upload batch, degrading per file
//! - [`ordering`]: parse client ordering input and compute persisted sort keys
//! - [`reconcile`]: decide which persisted images an update removes

pub mod batch;
pub mod normalizer;
pub mod ordering;
pub mod reconcile;

pub use batch::{BatchProcessor, NormalizeOutcome};
pub use normalizer::{
    render_jpeg, target_dimensions, ImageNormalizer, NormalizeError, ProcessedImage,
    RenderedImage, UploadedFile,
};
pub use ordering::{parse_kept_urls, resolve_order, ImageOrderSpec, OrderSpecError};
pub use reconcile::plan_removals;
