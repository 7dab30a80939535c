use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use katreview_core::{
    models::{CategoryRequest, CategoryResponse},
    slugify, AppError,
};
use validator::Validate;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::MessageResponse;
use crate::state::DbState;

/// Slug from the request, or derived from the name
fn category_slug(request: &CategoryRequest) -> String {
    match request.slug.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => slugify(slug),
        _ => slugify(&request.name),
    }
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    responses(
        (status = 200, description = "All categories", body = Vec<CategoryResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_categories(
    State(db): State<DbState>,
) -> Result<Json<Vec<CategoryResponse>>, HttpAppError> {
    let categories = db.categories.list().await?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/categories/{slug}",
    tag = "categories",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
pub async fn get_category(
    State(db): State<DbState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, HttpAppError> {
    let category = db
        .categories
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Slug already taken", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(db, request), fields(operation = "create_category"))]
pub async fn create_category(
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let slug = category_slug(&request);
    let category = db
        .categories
        .create(request.name.trim(), &slug, request.description.as_deref())
        .await?;

    tracing::info!(category_id = category.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "categories",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Slug already taken", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(db, request), fields(operation = "update_category"))]
pub async fn update_category(
    State(db): State<DbState>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> Result<Json<CategoryResponse>, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let slug = category_slug(&request);
    let category = db
        .categories
        .update(id, request.name.trim(), &slug, request.description.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category.into()))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "categories",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(db), fields(operation = "delete_category"))]
pub async fn delete_category(
    State(db): State<DbState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    if !db.categories.delete(id).await? {
        return Err(AppError::NotFound("Category not found".to_string()).into());
    }

    tracing::info!(category_id = id, "Category deleted");
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}
