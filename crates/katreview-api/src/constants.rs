//! HTTP-layer constants

/// Prefix of every JSON route
pub const API_PREFIX: &str = "/api";

/// Multipart field carrying image files
pub const IMAGES_FIELD: &str = "images";

/// Timeout applied to the health check's database probe
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;
