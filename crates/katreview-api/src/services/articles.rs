//! Assembling article responses with their images

use crate::state::DbState;
use katreview_core::{
    models::{ArticleImage, ArticleResponse, ArticleRow},
    AppError,
};
use std::collections::HashMap;

/// Attach each row's images (in display order) with a single query.
pub async fn with_images(db: &DbState, rows: Vec<ArticleRow>) -> Result<Vec<ArticleResponse>, AppError> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut by_article: HashMap<i64, Vec<ArticleImage>> = HashMap::new();
    for image in db.images.list_for_articles(&ids).await? {
        by_article.entry(image.article_id).or_default().push(image);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let images = by_article.remove(&row.id).unwrap_or_default();
            ArticleResponse::new(row, images)
        })
        .collect())
}

/// Response for a single article
pub async fn single(db: &DbState, row: ArticleRow) -> Result<ArticleResponse, AppError> {
    let images = db.images.list_for_article(row.id).await?;
    Ok(ArticleResponse::new(row, images))
}

/// Load an article by id and render it, `NotFound` when it does not exist
pub async fn load_by_id(db: &DbState, id: i64) -> Result<ArticleResponse, AppError> {
    let row = db
        .articles
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;
    single(db, row).await
}
