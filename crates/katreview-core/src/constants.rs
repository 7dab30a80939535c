//! Application-wide constants.

/// Width cap applied by the image normalizer.
pub const IMAGE_MAX_WIDTH: u32 = 750;

/// JPEG quality used for normalized article images.
pub const IMAGE_JPEG_QUALITY: u8 = 85;

/// Maximum number of image parts accepted in one article create/update request.
pub const MAX_IMAGES_PER_REQUEST: usize = 10;

/// Prefix of every storage key written by the normalizer.
pub const PROCESSED_PREFIX: &str = "processed-";

/// Sort key reserved for the cover image of an upload batch.
pub const COVER_SORT_KEY: i32 = -1;

/// Default page size for `GET /api/articles`.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for any `limit` query parameter.
pub const MAX_PAGE_SIZE: i64 = 100;

pub const DEFAULT_LATEST_LIMIT: i64 = 5;
pub const DEFAULT_CATEGORY_LIMIT: i64 = 6;
pub const DEFAULT_SEARCH_LIMIT: i64 = 10;
pub const RELATED_ARTICLES_LIMIT: i64 = 4;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Slug used when a title contains nothing sluggable.
pub const FALLBACK_SLUG: &str = "bai-viet";
