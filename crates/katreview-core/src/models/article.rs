use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::article_image::{ArticleImage, ArticleImageResponse};

/// Article joined with the name and slug of its category.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ArticleRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub meta_description: Option<String>,
    pub description: Option<String>,
    pub content: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub featured: bool,
    pub views: i64,
}

/// Editable article fields, shared by create and update.
#[derive(Debug, Clone, Default)]
pub struct ArticleFields {
    pub title: String,
    pub meta_description: Option<String>,
    pub description: Option<String>,
    pub content: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub category_id: Option<i64>,
    pub featured: bool,
}

/// Category filter of `GET /api/articles`: a numeric id or a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleFilter {
    CategoryId(i64),
    CategorySlug(String),
}

impl ArticleFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = raw.parse() {
                return Some(ArticleFilter::CategoryId(id));
            }
        }
        Some(ArticleFilter::CategorySlug(raw.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorResponse {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategorySummary {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    #[serde(rename = "_id")]
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub meta_description: Option<String>,
    pub description: Option<String>,
    pub content: String,
    pub author: AuthorResponse,
    pub category: Option<CategorySummary>,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub featured: bool,
    pub views: i64,
    pub images: Vec<ArticleImageResponse>,
}

impl ArticleResponse {
    /// `images` must already be in display order.
    pub fn new(row: ArticleRow, images: Vec<ArticleImage>) -> Self {
        let category = match (row.category_id, row.category_name, row.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategorySummary { id, name, slug }),
            _ => None,
        };

        ArticleResponse {
            id: row.id,
            title: row.title,
            slug: row.slug,
            meta_description: row.meta_description,
            description: row.description,
            content: row.content,
            author: AuthorResponse {
                name: row.author_name,
                email: row.author_email,
            },
            category,
            published_at: row.published_at,
            updated_at: row.updated_at,
            featured: row.featured,
            views: row.views,
            images: images.into_iter().map(ArticleImageResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleResponse>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}

impl ArticleListResponse {
    pub fn new(articles: Vec<ArticleResponse>, page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        ArticleListResponse {
            articles,
            total_pages,
            current_page: page,
            total,
        }
    }
}
