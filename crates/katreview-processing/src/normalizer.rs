//! Image normalization
//!
//! Every article image is published as a 3:2 progressive JPEG no wider than the
//! configured maximum (750px by default). Narrower sources keep their width and
//! are cropped to 3:2; nothing is upscaled.

use image::imageops::FilterType;
use image::{ImageReader, RgbImage};
use katreview_storage::{keys, Storage, StorageError};
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

/// A raw upload staged in storage, waiting to be normalized.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub key: String,
    pub url: String,
    pub size_bytes: u64,
}

/// A normalized JPEG written to storage.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub key: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub original_name: String,
    pub size_bytes: u64,
}

/// Encoded output of [`render_jpeg`].
#[derive(Debug)]
pub struct RenderedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("JPEG encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Image worker failed: {0}")]
    Worker(String),

    #[error("Staged upload unavailable: {0}")]
    SourceUnavailable(#[source] StorageError),

    #[error("Failed to write normalized image: {0}")]
    StorageWriteFailed(#[source] StorageError),
}

impl NormalizeError {
    /// Whether the untouched original can still be published in place of the
    /// normalized image.
    pub fn keeps_original(&self) -> bool {
        matches!(
            self,
            NormalizeError::UnsupportedFormat(_)
                | NormalizeError::EncodeFailed(_)
                | NormalizeError::Worker(_)
        )
    }
}

/// Output box for a source of `natural_width`: width capped at `max_width`,
/// height `round(width * 2 / 3)`.
pub fn target_dimensions(natural_width: u32, max_width: u32) -> (u32, u32) {
    let width = natural_width.min(max_width).max(1);
    let height = ((width as f64) * 2.0 / 3.0).round() as u32;
    (width, height.max(1))
}

/// Decode `data`, cover-fit it into the 3:2 target box with a centered crop and
/// encode a progressive JPEG.
pub fn render_jpeg(data: &[u8], max_width: u32, quality: u8) -> Result<RenderedImage, NormalizeError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| NormalizeError::UnsupportedFormat(e.to_string()))?
        .decode()
        .map_err(|e| NormalizeError::UnsupportedFormat(e.to_string()))?;

    let (width, height) = target_dimensions(img.width(), max_width);
    let rgb = img.resize_to_fill(width, height, FilterType::Lanczos3).to_rgb8();

    let data = encode_jpeg(&rgb, quality)?;
    Ok(RenderedImage {
        data,
        width: rgb.width(),
        height: rgb.height(),
    })
}

/// Compress to JPEG using mozjpeg
fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, NormalizeError> {
    let encode = || -> std::io::Result<Vec<u8>> {
        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(rgb.width() as usize, rgb.height() as usize);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new())?;
        comp.write_scanlines(rgb.as_raw())?;
        comp.finish()
    };

    encode().map_err(|e| NormalizeError::EncodeFailed(e.to_string()))
}

/// Normalizes staged uploads and swaps them for the processed file in storage.
#[derive(Clone)]
pub struct ImageNormalizer {
    storage: Arc<dyn Storage>,
    max_width: u32,
    quality: u8,
}

impl ImageNormalizer {
    pub fn new(storage: Arc<dyn Storage>, max_width: u32, quality: u8) -> Self {
        Self {
            storage,
            max_width,
            quality,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Normalize one staged upload.
    ///
    /// On success the processed JPEG is stored under a fresh `processed-` key and
    /// the staged original is deleted. A failed delete is logged and otherwise
    /// ignored. On error nothing new is left in storage and the original stays.
    pub async fn normalize(&self, input: &UploadedFile) -> Result<ProcessedImage, NormalizeError> {
        let processed = self.render_and_store(input).await?;
        self.discard_original(input).await;
        Ok(processed)
    }

    /// Store the normalized copy of `input` and leave the original in place,
    /// for callers that must repoint a reference before the original goes.
    #[tracing::instrument(skip(self, input), fields(key = %input.key, original = %input.original_name))]
    pub async fn render_and_store(&self, input: &UploadedFile) -> Result<ProcessedImage, NormalizeError> {
        let start = std::time::Instant::now();
        let data = self
            .storage
            .download(&input.key)
            .await
            .map_err(NormalizeError::SourceUnavailable)?;

        let (max_width, quality) = (self.max_width, self.quality);
        let rendered =
            tokio::task::spawn_blocking(move || render_jpeg(&data, max_width, quality))
                .await
                .map_err(|e| NormalizeError::Worker(e.to_string()))??;

        let key = keys::processed_key(&input.original_name);
        let size_bytes = rendered.data.len() as u64;
        let url = self
            .storage
            .upload_with_key(&key, rendered.data, "image/jpeg")
            .await
            .map_err(NormalizeError::StorageWriteFailed)?;

        tracing::info!(
            processed_key = %key,
            width = rendered.width,
            height = rendered.height,
            input_bytes = input.size_bytes,
            output_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image normalized"
        );

        Ok(ProcessedImage {
            key,
            url,
            width: rendered.width,
            height: rendered.height,
            original_name: input.original_name.clone(),
            size_bytes,
        })
    }

    /// Best-effort delete of a staged original
    pub async fn discard_original(&self, input: &UploadedFile) {
        if let Err(e) = self.storage.delete(&input.key).await {
            tracing::warn!(
                error = %e,
                key = %input.key,
                "Failed to delete original upload after normalization"
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    pub fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::png;
    use super::*;
    use katreview_storage::LocalStorage;

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(4000, 750), (750, 500));
        assert_eq!(target_dimensions(750, 750), (750, 500));
        assert_eq!(target_dimensions(600, 750), (600, 400));
        assert_eq!(target_dimensions(601, 750), (601, 401));
        assert_eq!(target_dimensions(1, 750), (1, 1));
    }

    #[test]
    fn test_render_wide_image_is_750x500_jpeg() {
        let rendered = render_jpeg(&png(1200, 900), 750, 85).unwrap();
        assert_eq!((rendered.width, rendered.height), (750, 500));

        let decoded = image::load_from_memory(&rendered.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (750, 500));
        assert_eq!(
            image::guess_format(&rendered.data).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_render_narrow_portrait_keeps_width() {
        let rendered = render_jpeg(&png(300, 800), 750, 85).unwrap();
        assert_eq!((rendered.width, rendered.height), (300, 200));
    }

    #[test]
    fn test_render_rejects_non_image() {
        let err = render_jpeg(b"definitely not an image", 750, 85).unwrap_err();
        assert!(matches!(err, NormalizeError::UnsupportedFormat(_)));
        assert!(err.keeps_original());
    }

    #[tokio::test]
    async fn test_normalize_replaces_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path(), "/uploads".to_string())
                .await
                .unwrap(),
        );
        let data = png(900, 900);
        let url = storage
            .upload_with_key("staged-cover.png", data.clone(), "image/png")
            .await
            .unwrap();
        let input = UploadedFile {
            original_name: "cover.png".to_string(),
            content_type: "image/png".to_string(),
            key: "staged-cover.png".to_string(),
            url,
            size_bytes: data.len() as u64,
        };

        let normalizer = ImageNormalizer::new(storage.clone(), 750, 85);
        let processed = normalizer.normalize(&input).await.unwrap();

        assert_eq!((processed.width, processed.height), (750, 500));
        assert!(processed.key.starts_with("processed-"));
        assert!(processed.key.ends_with("-cover.jpg"));
        assert_eq!(processed.url, format!("/uploads/{}", processed.key));
        assert!(storage.exists(&processed.key).await.unwrap());
        assert!(!storage.exists("staged-cover.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_normalize_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path(), "/uploads".to_string())
                .await
                .unwrap(),
        );
        let input = UploadedFile {
            original_name: "gone.png".to_string(),
            content_type: "image/png".to_string(),
            key: "gone.png".to_string(),
            url: "/uploads/gone.png".to_string(),
            size_bytes: 0,
        };

        let err = ImageNormalizer::new(storage, 750, 85)
            .normalize(&input)
            .await
            .unwrap_err();
        assert!(matches!(err, NormalizeError::SourceUnavailable(_)));
        assert!(!err.keeps_original());
    }
}
