//! Public article reads

use axum::{
    extract::{Path, Query, State},
    Json,
};
use katreview_core::{
    constants::{DEFAULT_CATEGORY_LIMIT, DEFAULT_LATEST_LIMIT, DEFAULT_PAGE_SIZE, RELATED_ARTICLES_LIMIT},
    models::{ArticleFilter, ArticleListResponse, ArticleResponse},
    AppError,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::articles;
use crate::state::DbState;
use crate::utils::pagination::{clamp_limit, clamp_page, page_offset};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<i64>,
    /// Page size (default 10)
    pub limit: Option<i64>,
    /// Category id or slug
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// Resolve the `category` filter to an id. An unknown slug does not filter.
async fn resolve_category_filter(db: &DbState, raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.and_then(ArticleFilter::parse) {
        Some(ArticleFilter::CategoryId(id)) => Ok(Some(id)),
        Some(ArticleFilter::CategorySlug(slug)) => {
            let category = db.categories.get_by_slug(&slug).await?;
            if category.is_none() {
                tracing::debug!(slug = %slug, "Unknown category filter ignored");
            }
            Ok(category.map(|c| c.id))
        }
        None => Ok(None),
    }
}

#[utoipa::path(
    get,
    path = "/api/articles",
    tag = "articles",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of articles, newest first", body = ArticleListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(operation = "list_articles"))]
pub async fn list_articles(
    State(db): State<DbState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ArticleListResponse>, HttpAppError> {
    let page = clamp_page(query.page);
    let limit = clamp_limit(query.limit, DEFAULT_PAGE_SIZE);
    let category_id = resolve_category_filter(&db, query.category.as_deref()).await?;

    let rows = db
        .articles
        .list(category_id, limit, page_offset(page, limit))
        .await?;
    let total = db.articles.count(category_id).await?;
    let articles = articles::with_images(&db, rows).await?;

    Ok(Json(ArticleListResponse::new(articles, page, limit, total)))
}

#[utoipa::path(
    get,
    path = "/api/articles/latest",
    tag = "articles",
    params(LimitQuery),
    responses(
        (status = 200, description = "Most recent articles", body = Vec<ArticleResponse>)
    )
)]
pub async fn latest_articles(
    State(db): State<DbState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ArticleResponse>>, HttpAppError> {
    let limit = clamp_limit(query.limit, DEFAULT_LATEST_LIMIT);
    let rows = db.articles.list(None, limit, 0).await?;
    Ok(Json(articles::with_images(&db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/api/articles/category/{slug}",
    tag = "articles",
    params(("slug" = String, Path, description = "Category slug"), LimitQuery),
    responses(
        (status = 200, description = "Newest articles of the category", body = Vec<ArticleResponse>),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
pub async fn articles_by_category(
    State(db): State<DbState>,
    Path(slug): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ArticleResponse>>, HttpAppError> {
    let category = db
        .categories
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let limit = clamp_limit(query.limit, DEFAULT_CATEGORY_LIMIT);
    let rows = db.articles.list(Some(category.id), limit, 0).await?;
    Ok(Json(articles::with_images(&db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/api/articles/{slug}",
    tag = "articles",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Article with its images; the view counter is incremented", body = ArticleResponse),
        (status = 404, description = "Article not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(operation = "get_article"))]
pub async fn get_article(
    State(db): State<DbState>,
    Path(slug): Path<String>,
) -> Result<Json<ArticleResponse>, HttpAppError> {
    let mut row = db
        .articles
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    row.views = db.articles.increment_views(row.id).await?;

    Ok(Json(articles::single(&db, row).await?))
}

#[utoipa::path(
    get,
    path = "/api/articles/{slug}/related",
    tag = "articles",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Up to 4 articles from the same category", body = Vec<ArticleResponse>),
        (status = 404, description = "Article not found", body = ErrorResponse)
    )
)]
pub async fn related_articles(
    State(db): State<DbState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ArticleResponse>>, HttpAppError> {
    let article = db
        .articles
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    let Some(category_id) = article.category_id else {
        return Ok(Json(Vec::new()));
    };

    let rows = db
        .articles
        .related(article.id, category_id, RELATED_ARTICLES_LIMIT)
        .await?;
    Ok(Json(articles::with_images(&db, rows).await?))
}
