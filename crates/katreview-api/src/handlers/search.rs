use axum::{
    extract::{Query, State},
    Json,
};
use katreview_core::{constants::DEFAULT_SEARCH_LIMIT, models::ArticleResponse};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::articles;
use crate::state::DbState;
use crate::utils::pagination::clamp_limit;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Text matched case-insensitively against title, description, content and author
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/search",
    tag = "search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching articles, newest first; empty for a blank query", body = Vec<ArticleResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(operation = "search"))]
pub async fn search_articles(
    State(db): State<DbState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ArticleResponse>>, HttpAppError> {
    let term = query.q.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let limit = clamp_limit(query.limit, DEFAULT_SEARCH_LIMIT);
    let rows = db.articles.search(term, limit).await?;
    tracing::debug!(results = rows.len(), "Search completed");

    Ok(Json(articles::with_images(&db, rows).await?))
}
