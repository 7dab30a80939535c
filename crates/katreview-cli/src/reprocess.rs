//! Bring already-persisted article images through the normalizer.

use katreview_core::models::ArticleImage;
use katreview_processing::{ImageNormalizer, UploadedFile};
use katreview_storage::keys;
use std::fmt;
use std::future::Future;

/// What happened to one `article_images` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Normalized and the row now points at `url`
    Processed { url: String },
    /// Left alone: `reason` says why
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReprocessSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ReprocessSummary {
    pub fn record(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Processed { .. } => self.processed += 1,
            RowOutcome::Skipped { .. } => self.skipped += 1,
            RowOutcome::Failed { .. } => self.errors += 1,
        }
    }
}

impl fmt::Display for ReprocessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed: {}, skipped: {}, errors: {}",
            self.processed, self.skipped, self.errors
        )
    }
}

/// Input for the normalizer, when the row's file lives in our storage
pub fn uploaded_file_for(image: &ArticleImage, normalizer: &ImageNormalizer) -> Option<UploadedFile> {
    if keys::is_processed(&image.url) {
        return None;
    }
    let key = normalizer.storage().key_for_url(&image.url)?;

    let original_name = image
        .alt_text
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&key)
        .to_string();

    Some(UploadedFile {
        original_name,
        content_type: "application/octet-stream".to_string(),
        url: image.url.clone(),
        key,
        size_bytes: 0,
    })
}

/// Normalize the file behind one row and repoint the row through `persist`.
///
/// The original file is deleted only after `persist` reports the row updated.
/// When the update fails the row keeps pointing at the original and the new
/// file is removed again.
pub async fn reprocess_one<F, Fut, E>(
    image: &ArticleImage,
    normalizer: &ImageNormalizer,
    dry_run: bool,
    persist: F,
) -> RowOutcome
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: fmt::Display,
{
    let Some(input) = uploaded_file_for(image, normalizer) else {
        return RowOutcome::Skipped {
            reason: "not a local unprocessed upload".to_string(),
        };
    };

    match normalizer.storage().exists(&input.key).await {
        Ok(true) => {}
        Ok(false) => {
            return RowOutcome::Skipped {
                reason: format!("file {} is missing", input.key),
            }
        }
        Err(e) => {
            return RowOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }

    if dry_run {
        return RowOutcome::Processed {
            url: input.url.clone(),
        };
    }

    let processed = match normalizer.render_and_store(&input).await {
        Ok(processed) => processed,
        Err(e) if e.keeps_original() => {
            return RowOutcome::Skipped {
                reason: e.to_string(),
            }
        }
        Err(e) => {
            return RowOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    let reason = match persist(processed.url.clone()).await {
        Ok(true) => {
            normalizer.discard_original(&input).await;
            return RowOutcome::Processed { url: processed.url };
        }
        Ok(false) => "row disappeared during reprocessing".to_string(),
        Err(e) => format!("row update failed, original kept: {}", e),
    };

    if let Err(e) = normalizer.storage().delete(&processed.key).await {
        tracing::error!(
            error = %e,
            image_id = image.id,
            processed_key = %processed.key,
            "Failed to remove unreferenced processed file; delete it by hand"
        );
    }
    RowOutcome::Failed { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use image::{ImageFormat, Rgb, RgbImage};
    use katreview_storage::{LocalStorage, Storage};
    use std::io::Cursor;
    use std::sync::Arc;

    fn row(url: &str) -> ArticleImage {
        ArticleImage {
            id: 1,
            article_id: 1,
            url: url.to_string(),
            alt_text: Some("cover.png".to_string()),
            caption: None,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    async fn updated(_url: String) -> Result<bool, String> {
        Ok(true)
    }

    fn stored_files(dir: &tempfile::TempDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    async fn normalizer(dir: &tempfile::TempDir) -> ImageNormalizer {
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path(), "/uploads".to_string())
                .await
                .unwrap(),
        );
        ImageNormalizer::new(storage, 750, 85)
    }

    #[tokio::test]
    async fn test_reprocess_legacy_upload() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = normalizer(&dir).await;
        normalizer
            .storage()
            .upload_with_key("1700000000-cover.png", png(1500, 1500), "image/png")
            .await
            .unwrap();

        let outcome =
            reprocess_one(&row("/uploads/1700000000-cover.png"), &normalizer, false, updated).await;
        let RowOutcome::Processed { url } = outcome else {
            panic!("expected processed, got {:?}", outcome);
        };
        assert!(url.starts_with("/uploads/processed-"));
        assert!(!dir.path().join("1700000000-cover.png").exists());
        assert_eq!(stored_files(&dir).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_row_update_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = normalizer(&dir).await;
        normalizer
            .storage()
            .upload_with_key("1700000000-cover.png", png(1500, 1500), "image/png")
            .await
            .unwrap();

        let outcome = reprocess_one(
            &row("/uploads/1700000000-cover.png"),
            &normalizer,
            false,
            |_url| async { Err::<bool, _>("connection reset") },
        )
        .await;

        let RowOutcome::Failed { reason } = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert!(reason.contains("connection reset"));
        assert_eq!(stored_files(&dir), vec!["1700000000-cover.png".to_string()]);
    }

    #[tokio::test]
    async fn test_vanished_row_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = normalizer(&dir).await;
        normalizer
            .storage()
            .upload_with_key("old.png", png(300, 300), "image/png")
            .await
            .unwrap();

        let outcome = reprocess_one(&row("/uploads/old.png"), &normalizer, false, |_url| async {
            Ok::<_, String>(false)
        })
        .await;

        assert!(matches!(outcome, RowOutcome::Failed { .. }));
        assert_eq!(stored_files(&dir), vec!["old.png".to_string()]);
    }

    #[tokio::test]
    async fn test_dry_run_leaves_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = normalizer(&dir).await;
        normalizer
            .storage()
            .upload_with_key("old.png", png(100, 100), "image/png")
            .await
            .unwrap();

        let outcome = reprocess_one(&row("/uploads/old.png"), &normalizer, true, |_url| async {
            Err::<bool, _>("dry run must not persist")
        })
        .await;
        assert!(matches!(outcome, RowOutcome::Processed { .. }));
        assert!(dir.path().join("old.png").exists());
    }

    #[tokio::test]
    async fn test_skips_processed_external_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = normalizer(&dir).await;

        for url in [
            "/uploads/processed-abc-cover.jpg",
            "https://cdn.example.com/cover.png",
            "/uploads/missing.png",
        ] {
            let outcome = reprocess_one(&row(url), &normalizer, false, updated).await;
            assert!(matches!(outcome, RowOutcome::Skipped { .. }), "{}", url);
        }
    }

    #[tokio::test]
    async fn test_undecodable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = normalizer(&dir).await;
        normalizer
            .storage()
            .upload_with_key("notes.png", b"plain text".to_vec(), "image/png")
            .await
            .unwrap();

        let outcome = reprocess_one(&row("/uploads/notes.png"), &normalizer, false, updated).await;
        assert!(matches!(outcome, RowOutcome::Skipped { .. }));
        assert!(dir.path().join("notes.png").exists());
    }

    #[test]
    fn test_summary_display() {
        let mut summary = ReprocessSummary::default();
        summary.record(&RowOutcome::Processed { url: "u".to_string() });
        summary.record(&RowOutcome::Skipped { reason: "r".to_string() });
        summary.record(&RowOutcome::Skipped { reason: "r".to_string() });
        assert_eq!(summary.to_string(), "processed: 1, skipped: 2, errors: 0");
    }
}
