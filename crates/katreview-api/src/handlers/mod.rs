pub mod article_write;
pub mod articles;
pub mod auth;
pub mod categories;
pub mod search;

use serde::Serialize;
use utoipa::ToSchema;

/// Plain confirmation body, e.g. after a delete
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
