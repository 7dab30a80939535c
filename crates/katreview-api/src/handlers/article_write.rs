//! Article create/update/delete with the image pipeline

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use katreview_core::{
    models::{ArticleFields, ArticleResponse, NewArticleImage},
    slugify, unique_slug, AppError,
};
use katreview_processing::{parse_kept_urls, ImageOrderSpec};
use std::collections::HashSet;

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::article_images::{prepare_images, reconcile_images};
use crate::services::articles;
use crate::state::{DbState, MediaState};
use crate::utils::upload::{read_article_form, ArticleForm};

/// Slug for `title` that no other article uses
async fn available_slug(
    db: &DbState,
    title: &str,
    exclude_id: Option<i64>,
) -> Result<String, AppError> {
    let base = slugify(title);
    let taken: HashSet<String> = db
        .articles
        .slugs_like(&base, exclude_id)
        .await?
        .into_iter()
        .collect();
    Ok(unique_slug(&base, |candidate| taken.contains(candidate)))
}

async fn ensure_category(db: &DbState, fields: &ArticleFields) -> Result<(), AppError> {
    if let Some(category_id) = fields.category_id {
        if db.categories.get_by_id(category_id).await?.is_none() {
            return Err(AppError::InvalidInput(format!(
                "Category {} does not exist",
                category_id
            )));
        }
    }
    Ok(())
}

/// Ordering input of the request, checked against the number of uploads
fn order_spec(form: &ArticleForm) -> Result<ImageOrderSpec, HttpAppError> {
    let spec = ImageOrderSpec::parse(form.image_order.as_deref(), form.cover_index.as_deref())?;
    if !form.files.is_empty() {
        spec.validate(form.files.len())?;
    }
    Ok(spec)
}

async fn insert_article(
    db: &DbState,
    fields: &ArticleFields,
    slug: &str,
    images: &[NewArticleImage],
) -> Result<i64, AppError> {
    let mut tx = db.pool.begin().await?;
    let id = db.articles.insert_tx(&mut tx, fields, slug).await?;
    db.images.insert_many_tx(&mut tx, id, images).await?;
    tx.commit().await?;
    Ok(id)
}

async fn update_article_rows(
    db: &DbState,
    id: i64,
    fields: &ArticleFields,
    slug: &str,
    kept: Option<&[String]>,
    images: &[NewArticleImage],
) -> Result<(), AppError> {
    let mut tx = db.pool.begin().await?;
    if !db.articles.update_tx(&mut tx, id, fields, slug).await? {
        return Err(AppError::NotFound("Article not found".to_string()));
    }
    reconcile_images(db, &mut tx, id, kept, images).await?;
    tx.commit().await?;
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/articles",
    tag = "articles",
    request_body(content_type = "multipart/form-data", description = "Article fields, `images` file parts, `imageOrder` and `coverIndex`"),
    responses(
        (status = 201, description = "Article created", body = ArticleResponse),
        (status = 400, description = "Invalid fields, files or ordering input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Storage or database failure; nothing was saved", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(db, media, user, multipart), fields(operation = "create_article", user_id = user.id))]
pub async fn create_article(
    State(db): State<DbState>,
    State(media): State<MediaState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ArticleResponse>), HttpAppError> {
    let form = read_article_form(multipart, &media).await?;
    let fields = form.fields()?;
    let spec = order_spec(&form)?;
    ensure_category(&db, &fields).await?;

    let slug = available_slug(&db, &fields.title, None).await?;
    let prepared = prepare_images(&media, form.files, &spec).await?;

    let id = match insert_article(&db, &fields, &slug, &prepared.images).await {
        Ok(id) => id,
        Err(e) => {
            prepared.discard(&media.storage).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        article_id = id,
        slug = %slug,
        image_count = prepared.images.len(),
        "Article created"
    );

    let article = articles::load_by_id(&db, id).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

#[utoipa::path(
    put,
    path = "/api/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "Article id")),
    request_body(content_type = "multipart/form-data", description = "Article fields, new `images`, `imageOrder`, `coverIndex`, `replaceImages` and `keptImageUrls`"),
    responses(
        (status = 200, description = "Article updated", body = ArticleResponse),
        (status = 400, description = "Invalid fields, files or ordering input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Article not found", body = ErrorResponse),
        (status = 500, description = "Storage or database failure; the previous state is kept", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(db, media, user, multipart), fields(operation = "update_article", user_id = user.id))]
pub async fn update_article(
    State(db): State<DbState>,
    State(media): State<MediaState>,
    user: AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ArticleResponse>, HttpAppError> {
    let existing = db
        .articles
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    let form = read_article_form(multipart, &media).await?;
    let fields = form.fields()?;
    let spec = order_spec(&form)?;
    let kept = if form.replace_images() {
        Some(parse_kept_urls(form.kept_image_urls.as_deref())?)
    } else {
        None
    };
    ensure_category(&db, &fields).await?;

    let slug = if fields.title == existing.title {
        existing.slug.clone()
    } else {
        available_slug(&db, &fields.title, Some(id)).await?
    };

    let prepared = prepare_images(&media, form.files, &spec).await?;

    if let Err(e) =
        update_article_rows(&db, id, &fields, &slug, kept.as_deref(), &prepared.images).await
    {
        prepared.discard(&media.storage).await;
        return Err(e.into());
    }

    tracing::info!(
        article_id = id,
        slug = %slug,
        new_images = prepared.images.len(),
        replace_images = kept.is_some(),
        "Article updated"
    );

    Ok(Json(articles::load_by_id(&db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article and its image rows deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Article not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(db, user), fields(operation = "delete_article", user_id = user.id))]
pub async fn delete_article(
    State(db): State<DbState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    if !db.articles.delete(id).await? {
        return Err(AppError::NotFound("Article not found".to_string()).into());
    }

    tracing::info!(article_id = id, "Article deleted");
    Ok(Json(MessageResponse::new("Article deleted successfully")))
}
