//! Authentication: HS256 tokens, the bearer middleware and the request extractor.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtService;
pub use models::{AuthUser, Claims};
