use katreview_core::{
    constants::{COVER_SORT_KEY, PROCESSED_PREFIX},
    models::{ArticleImage, NewArticleImage},
    AppError,
};
use sqlx::{PgPool, Postgres, Transaction};

const IMAGE_COLUMNS: &str = "id, article_id, url, alt_text, caption, sort_order, created_at";

/// Repository for the ordered image set of each article
#[derive(Clone)]
pub struct ArticleImageRepository {
    pool: PgPool,
}

impl ArticleImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Images of one article in display order
    #[tracing::instrument(skip(self), fields(db.table = "article_images", db.operation = "select"))]
    pub async fn list_for_article(&self, article_id: i64) -> Result<Vec<ArticleImage>, AppError> {
        let images = sqlx::query_as::<Postgres, ArticleImage>(&format!(
            r#"
            SELECT {} FROM article_images
            WHERE article_id = $1
            ORDER BY sort_order ASC, id ASC
            "#,
            IMAGE_COLUMNS
        ))
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    /// Images of several articles, grouped by article and in display order
    #[tracing::instrument(skip(self, article_ids), fields(db.table = "article_images", db.operation = "select", count = article_ids.len()))]
    pub async fn list_for_articles(&self, article_ids: &[i64]) -> Result<Vec<ArticleImage>, AppError> {
        if article_ids.is_empty() {
            return Ok(Vec::new());
        }

        let images = sqlx::query_as::<Postgres, ArticleImage>(&format!(
            r#"
            SELECT {} FROM article_images
            WHERE article_id = ANY($1)
            ORDER BY article_id, sort_order ASC, id ASC
            "#,
            IMAGE_COLUMNS
        ))
        .bind(article_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    /// URLs currently attached to an article, read inside `tx`
    #[tracing::instrument(skip(self, tx), fields(db.table = "article_images", db.operation = "select"))]
    pub async fn urls_for_article_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        article_id: i64,
    ) -> Result<Vec<String>, AppError> {
        let urls = sqlx::query_scalar::<Postgres, String>(
            "SELECT url FROM article_images WHERE article_id = $1 ORDER BY sort_order ASC, id ASC",
        )
        .bind(article_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(urls)
    }

    /// Delete the images of `article_id` whose URL is in `urls`
    #[tracing::instrument(skip(self, tx, urls), fields(db.table = "article_images", db.operation = "delete", count = urls.len()))]
    pub async fn delete_by_urls_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        article_id: i64,
        urls: &[String],
    ) -> Result<u64, AppError> {
        if urls.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM article_images WHERE article_id = $1 AND url = ANY($2)")
            .bind(article_id)
            .bind(urls)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    /// Move the stored cover of `article_id` back to an ordinary key so a new
    /// cover can take the sentinel
    #[tracing::instrument(skip(self, tx), fields(db.table = "article_images", db.operation = "update"))]
    pub async fn demote_cover_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        article_id: i64,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE article_images SET sort_order = 0 WHERE article_id = $1 AND sort_order = $2",
        )
        .bind(article_id)
        .bind(COVER_SORT_KEY)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// Append images to an article inside `tx`
    #[tracing::instrument(skip(self, tx, images), fields(db.table = "article_images", db.operation = "insert", count = images.len()))]
    pub async fn insert_many_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        article_id: i64,
        images: &[NewArticleImage],
    ) -> Result<u64, AppError> {
        let mut inserted = 0;
        for image in images {
            let result = sqlx::query(
                r#"
                INSERT INTO article_images (article_id, url, alt_text, caption, sort_order)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(article_id)
            .bind(&image.url)
            .bind(&image.alt_text)
            .bind(&image.caption)
            .bind(image.sort_order)
            .execute(&mut **tx)
            .await?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    /// Rows whose file has not been through the normalizer yet
    #[tracing::instrument(skip(self), fields(db.table = "article_images", db.operation = "select"))]
    pub async fn list_unprocessed(&self) -> Result<Vec<ArticleImage>, AppError> {
        let images = sqlx::query_as::<Postgres, ArticleImage>(&format!(
            r#"
            SELECT {} FROM article_images
            WHERE url NOT LIKE $1
            ORDER BY id ASC
            "#,
            IMAGE_COLUMNS
        ))
        .bind(format!("%/{}%", PROCESSED_PREFIX))
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    #[tracing::instrument(skip(self), fields(db.table = "article_images", db.operation = "update", db.record_id = %id))]
    pub async fn update_url(&self, id: i64, url: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE article_images SET url = $2 WHERE id = $1")
            .bind(id)
            .bind(url)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
