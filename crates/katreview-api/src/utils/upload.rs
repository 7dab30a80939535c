//! Multipart parsing and file validation for article create/update requests

use crate::constants::IMAGES_FIELD;
use crate::state::MediaState;
use axum::extract::Multipart;
use katreview_core::{models::ArticleFields, AppError};

/// One image part as received, before it is staged in storage
#[derive(Debug)]
pub struct RawUpload {
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Text fields and image parts of an article form
#[derive(Debug, Default)]
pub struct ArticleForm {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub category_id: Option<String>,
    pub featured: Option<String>,
    pub cover_index: Option<String>,
    pub image_order: Option<String>,
    pub replace_images: Option<String>,
    pub kept_image_urls: Option<String>,
    pub files: Vec<RawUpload>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ArticleForm {
    /// Editable fields; `title` and `content` are required.
    pub fn fields(&self) -> Result<ArticleFields, AppError> {
        let title = non_empty(self.title.clone())
            .ok_or_else(|| AppError::InvalidInput("title is required".to_string()))?;
        if title.chars().count() > 255 {
            return Err(AppError::InvalidInput(
                "title must be at most 255 characters".to_string(),
            ));
        }

        let content = self
            .content
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::InvalidInput("content is required".to_string()))?;

        let category_id = match non_empty(self.category_id.clone()) {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                AppError::InvalidInput("categoryId must be a numeric id".to_string())
            })?),
            None => None,
        };

        Ok(ArticleFields {
            title,
            meta_description: non_empty(self.meta_description.clone()),
            description: non_empty(self.description.clone()),
            content,
            author_name: non_empty(self.author_name.clone()),
            author_email: non_empty(self.author_email.clone()),
            category_id,
            featured: self.featured.as_deref().map(str::trim) == Some("true"),
        })
    }

    /// `replaceImages=true` turns on reconciliation against `keptImageUrls`
    pub fn replace_images(&self) -> bool {
        self.replace_images.as_deref().map(str::trim) == Some("true")
    }
}

/// Read the whole multipart body. Image parts are validated as they arrive;
/// empty file parts (an untouched file input) are skipped.
pub async fn read_article_form(
    mut multipart: Multipart,
    limits: &MediaState,
) -> Result<ArticleForm, AppError> {
    let mut form = ArticleForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if name == IMAGES_FIELD {
            let original_name = field.file_name().map(|s| s.to_string()).unwrap_or_default();
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

            if data.is_empty() && original_name.is_empty() {
                continue;
            }

            if form.files.len() >= limits.max_images_per_request {
                return Err(AppError::InvalidInput(format!(
                    "At most {} images can be uploaded at once",
                    limits.max_images_per_request
                )));
            }

            validate_file_size(data.len(), limits.max_file_size)?;
            validate_file_extension(&original_name, &limits.allowed_extensions)?;
            validate_content_type(&content_type, &limits.allowed_content_types)?;

            form.files.push(RawUpload {
                original_name,
                content_type,
                data: data.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read field {}: {}", name, e)))?;

        let slot = match name.as_str() {
            "title" => &mut form.title,
            "metaDescription" => &mut form.meta_description,
            "description" => &mut form.description,
            "content" => &mut form.content,
            "authorName" => &mut form.author_name,
            "authorEmail" => &mut form.author_email,
            "categoryId" => &mut form.category_id,
            "featured" => &mut form.featured,
            "coverIndex" => &mut form.cover_index,
            "imageOrder" => &mut form.image_order,
            "replaceImages" => &mut form.replace_images,
            "keptImageUrls" => &mut form.kept_image_urls,
            other => {
                tracing::debug!(field = %other, "Ignoring unknown form field");
                continue;
            }
        };
        *slot = Some(value);
    }

    Ok(form)
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Validate content type against allowlist
pub fn validate_content_type(content_type: &str, allowed_types: &[String]) -> Result<(), AppError> {
    let normalized = normalize_mime_type(content_type).to_lowercase();
    if !allowed_types.iter().any(|ct| normalized == ct.to_lowercase()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type. Allowed types: {}",
            allowed_types.join(", ")
        )));
    }
    Ok(())
}

/// Validate file extension
pub fn validate_file_extension(filename: &str, allowed_extensions: &[String]) -> Result<(), AppError> {
    let extension = match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    };

    if !allowed_extensions.contains(&extension) {
        return Err(AppError::InvalidInput(format!(
            "Invalid file extension. Allowed extensions: {}",
            allowed_extensions.join(", ")
        )));
    }
    Ok(())
}
