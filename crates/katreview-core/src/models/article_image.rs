use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A persisted image of an article. Reads order by `sort_order ASC, id ASC`;
/// `sort_order = -1` marks the cover; an article holds at most one.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ArticleImage {
    pub id: i64,
    pub article_id: i64,
    pub url: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// An image about to be attached to an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticleImage {
    pub url: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub sort_order: i32,
}

impl NewArticleImage {
    /// Alt text defaults to the uploaded filename; empty captions are stored as NULL.
    pub fn new(url: String, original_name: &str, caption: Option<String>, sort_order: i32) -> Self {
        let alt_text = Some(original_name.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let caption = caption.filter(|c| !c.trim().is_empty());
        Self {
            url,
            alt_text,
            caption,
            sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArticleImageResponse {
    pub url: String,
    pub alt: String,
    pub caption: String,
}

impl From<ArticleImage> for ArticleImageResponse {
    fn from(image: ArticleImage) -> Self {
        ArticleImageResponse {
            url: image.url,
            alt: image.alt_text.unwrap_or_default(),
            caption: image.caption.unwrap_or_default(),
        }
    }
}
