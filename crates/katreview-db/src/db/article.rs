use katreview_core::{
    models::{ArticleFields, ArticleRow},
    AppError,
};
use sqlx::{PgPool, Postgres, Transaction};

use super::{conflict_on_unique, escape_like};

/// Article columns joined with the owning category's name and slug.
const ARTICLE_SELECT: &str = r#"
    SELECT a.id, a.title, a.slug, a.meta_description, a.description, a.content,
           a.author_name, a.author_email, a.category_id,
           c.name AS category_name, c.slug AS category_slug,
           a.published_at, a.updated_at, a.featured, a.views
    FROM articles a
    LEFT JOIN categories c ON c.id = a.category_id
"#;

/// Repository for articles
#[derive(Clone)]
pub struct ArticleRepository {
    pool: PgPool,
}

impl ArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Page of articles, newest first, optionally restricted to one category
    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "select"))]
    pub async fn list(
        &self,
        category_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ArticleRow>, AppError> {
        let rows = sqlx::query_as::<Postgres, ArticleRow>(&format!(
            r#"{}
            WHERE ($1::BIGINT IS NULL OR a.category_id = $1)
            ORDER BY a.published_at DESC, a.id DESC
            LIMIT $2 OFFSET $3
            "#,
            ARTICLE_SELECT
        ))
        .bind(category_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "count"))]
    pub async fn count(&self, category_id: Option<i64>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM articles WHERE ($1::BIGINT IS NULL OR category_id = $1)",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "select"))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<ArticleRow>, AppError> {
        let row = sqlx::query_as::<Postgres, ArticleRow>(&format!(
            "{} WHERE a.slug = $1",
            ARTICLE_SELECT
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: i64) -> Result<Option<ArticleRow>, AppError> {
        let row = sqlx::query_as::<Postgres, ArticleRow>(&format!(
            "{} WHERE a.id = $1",
            ARTICLE_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Bump the view counter, returning the new count
    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "update", db.record_id = %id))]
    pub async fn increment_views(&self, id: i64) -> Result<i64, AppError> {
        let views = sqlx::query_scalar::<Postgres, i64>(
            "UPDATE articles SET views = views + 1 WHERE id = $1 RETURNING views",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(views)
    }

    /// Other articles of the same category, newest first
    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "select"))]
    pub async fn related(
        &self,
        article_id: i64,
        category_id: i64,
        limit: i64,
    ) -> Result<Vec<ArticleRow>, AppError> {
        let rows = sqlx::query_as::<Postgres, ArticleRow>(&format!(
            r#"{}
            WHERE a.category_id = $1 AND a.id <> $2
            ORDER BY a.published_at DESC, a.id DESC
            LIMIT $3
            "#,
            ARTICLE_SELECT
        ))
        .bind(category_id)
        .bind(article_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Case-insensitive substring search over title, description, content and
    /// author name
    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "search"))]
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<ArticleRow>, AppError> {
        let pattern = format!("%{}%", escape_like(query));

        let rows = sqlx::query_as::<Postgres, ArticleRow>(&format!(
            r#"{}
            WHERE a.title ILIKE $1
               OR a.description ILIKE $1
               OR a.content ILIKE $1
               OR a.author_name ILIKE $1
            ORDER BY a.published_at DESC, a.id DESC
            LIMIT $2
            "#,
            ARTICLE_SELECT
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Existing slugs equal to `base` or of the form `base-...`, ignoring
    /// `exclude_id`. Feeds [`katreview_core::unique_slug`].
    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "select"))]
    pub async fn slugs_like(
        &self,
        base: &str,
        exclude_id: Option<i64>,
    ) -> Result<Vec<String>, AppError> {
        let slugs = sqlx::query_scalar::<Postgres, String>(
            r#"
            SELECT slug FROM articles
            WHERE (slug = $1 OR slug LIKE $2)
              AND ($3::BIGINT IS NULL OR id <> $3)
            "#,
        )
        .bind(base)
        .bind(format!("{}-%", escape_like(base)))
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(slugs)
    }

    /// Insert an article inside `tx`, returning its id
    #[tracing::instrument(skip(self, tx, fields), fields(db.table = "articles", db.operation = "insert"))]
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fields: &ArticleFields,
        slug: &str,
    ) -> Result<i64, AppError> {
        sqlx::query_scalar::<Postgres, i64>(
            r#"
            INSERT INTO articles (title, slug, meta_description, description, content,
                                  author_name, author_email, category_id, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&fields.title)
        .bind(slug)
        .bind(&fields.meta_description)
        .bind(&fields.description)
        .bind(&fields.content)
        .bind(&fields.author_name)
        .bind(&fields.author_email)
        .bind(fields.category_id)
        .bind(fields.featured)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Article slug already exists"))
    }

    /// Overwrite the editable fields inside `tx`. Returns false when the article
    /// does not exist.
    #[tracing::instrument(skip(self, tx, fields), fields(db.table = "articles", db.operation = "update", db.record_id = %id))]
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        fields: &ArticleFields,
        slug: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET title = $2, slug = $3, meta_description = $4, description = $5,
                content = $6, author_name = $7, author_email = $8, category_id = $9,
                featured = $10, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(slug)
        .bind(&fields.meta_description)
        .bind(&fields.description)
        .bind(&fields.content)
        .bind(&fields.author_name)
        .bind(&fields.author_email)
        .bind(fields.category_id)
        .bind(fields.featured)
        .execute(&mut **tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Article slug already exists"))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an article; its image rows go with it
    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
