//! KatReview API Library
//!
//! HTTP handlers, authentication, the article image upload service and
//! application setup.

mod api_doc;
pub mod constants;
mod handlers;
mod services;
pub mod setup;
mod telemetry;
mod utils;

pub mod auth;
pub mod error;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::ErrorResponse;
pub use setup::{build_state, initialize_app};
