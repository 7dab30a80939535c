//! Upload pipeline for article images
//!
//! stage raw parts in storage → normalize the batch → resolve sort keys, then
//! reconcile the persisted set inside the caller's transaction.

use crate::state::{DbState, MediaState};
use crate::utils::upload::RawUpload;
use katreview_core::{constants::COVER_SORT_KEY, models::NewArticleImage, AppError};
use katreview_processing::{
    plan_removals, resolve_order, ImageOrderSpec, NormalizeOutcome, UploadedFile,
};
use katreview_storage::{keys, Storage};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;

/// Images ready to be inserted, plus every storage key this request wrote.
#[derive(Debug, Default)]
pub struct PreparedImages {
    pub images: Vec<NewArticleImage>,
    pub stored_keys: Vec<String>,
}

impl PreparedImages {
    /// Best-effort removal of the files written for an abandoned request
    pub async fn discard(self, storage: &Arc<dyn Storage>) {
        remove_keys(storage, &self.stored_keys).await;
    }
}

/// Outcome of reconciling an article's persisted image set
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub removed: u64,
    pub demoted: u64,
    pub inserted: u64,
}

async fn remove_keys(storage: &Arc<dyn Storage>, stored: &[String]) {
    for key in stored {
        if let Err(e) = storage.delete(key).await {
            tracing::warn!(error = %e, key = %key, "Failed to clean up stored upload");
        }
    }
}

/// Write each raw part to storage under a fresh staging key. On failure the
/// parts staged so far are removed again.
async fn stage_uploads(
    storage: &Arc<dyn Storage>,
    files: Vec<RawUpload>,
) -> Result<Vec<UploadedFile>, AppError> {
    let mut staged: Vec<UploadedFile> = Vec::with_capacity(files.len());

    for file in files {
        let key = keys::staged_key(&file.original_name);
        let size_bytes = file.data.len() as u64;

        match storage
            .upload_with_key(&key, file.data, &file.content_type)
            .await
        {
            Ok(url) => staged.push(UploadedFile {
                original_name: file.original_name,
                content_type: file.content_type,
                key,
                url,
                size_bytes,
            }),
            Err(e) => {
                let written: Vec<String> = staged.into_iter().map(|f| f.key).collect();
                remove_keys(storage, &written).await;
                return Err(AppError::StorageWriteFailed(format!(
                    "Failed to store upload {}: {}",
                    file.original_name, e
                )));
            }
        }
    }

    Ok(staged)
}

/// Run uploaded parts through the image pipeline.
///
/// The ordering input must already be validated against `files.len()`. If any file ends up
/// `Failed`, every file written for the request is removed and the request
/// fails before the database is touched.
#[tracing::instrument(skip(media, files, spec), fields(file_count = files.len()))]
pub async fn prepare_images(
    media: &MediaState,
    files: Vec<RawUpload>,
    spec: &ImageOrderSpec,
) -> Result<PreparedImages, AppError> {
    if files.is_empty() {
        return Ok(PreparedImages::default());
    }

    let storage = &media.storage;
    let staged = stage_uploads(storage, files).await?;
    let count = staged.len();

    let outcomes = media.processor.process_all(staged).await;
    let stored_keys: Vec<String> = outcomes.iter().flat_map(NormalizeOutcome::stored_keys).collect();

    if let Some(NormalizeOutcome::Failed { original, reason }) =
        outcomes.iter().find(|o| o.is_failed())
    {
        let message = format!("Failed to store image {}: {}", original.original_name, reason);
        remove_keys(storage, &stored_keys).await;
        return Err(AppError::StorageWriteFailed(message));
    }

    let sort_keys = resolve_order(count, spec);
    let images = outcomes
        .iter()
        .zip(sort_keys)
        .filter_map(|(outcome, key)| outcome.to_new_image(None, key))
        .collect();

    Ok(PreparedImages {
        images,
        stored_keys,
    })
}

/// Drop persisted images missing from `kept` (when given) and append
/// `new_images`, all inside `tx`. A cover among `new_images` replaces the
/// stored one, which drops back to an ordinary key.
#[tracing::instrument(skip(db, tx, kept, new_images), fields(replace = kept.is_some()))]
pub async fn reconcile_images(
    db: &DbState,
    tx: &mut Transaction<'_, Postgres>,
    article_id: i64,
    kept: Option<&[String]>,
    new_images: &[NewArticleImage],
) -> Result<ReconcileSummary, AppError> {
    let existing = db.images.urls_for_article_tx(tx, article_id).await?;
    let removals = plan_removals(&existing, kept);

    let removed = db
        .images
        .delete_by_urls_tx(tx, article_id, &removals)
        .await?;
    let demoted = if new_images.iter().any(|i| i.sort_order == COVER_SORT_KEY) {
        db.images.demote_cover_tx(tx, article_id).await?
    } else {
        0
    };
    let inserted = db.images.insert_many_tx(tx, article_id, new_images).await?;

    tracing::debug!(removed, demoted, inserted, "Article images reconciled");

    Ok(ReconcileSummary {
        removed,
        demoted,
        inserted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use katreview_core::constants::PROCESSED_PREFIX;
    use katreview_processing::{BatchProcessor, ImageNormalizer};
    use katreview_storage::{LocalStorage, StorageError, StorageResult};
    use std::io::Cursor;
    use std::path::Path;

    /// Local storage that refuses to write normalized output
    struct ProcessedWriteFails(LocalStorage);

    #[async_trait]
    impl Storage for ProcessedWriteFails {
        async fn upload_with_key(
            &self,
            key: &str,
            data: Vec<u8>,
            content_type: &str,
        ) -> StorageResult<String> {
            if key.starts_with(PROCESSED_PREFIX) {
                return Err(StorageError::UploadFailed("disk full".to_string()));
            }
            self.0.upload_with_key(key, data, content_type).await
        }

        async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
            self.0.download(key).await
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            self.0.delete(key).await
        }

        async fn exists(&self, key: &str) -> StorageResult<bool> {
            self.0.exists(key).await
        }

        fn url_for(&self, key: &str) -> String {
            self.0.url_for(key)
        }

        fn key_for_url(&self, url: &str) -> Option<String> {
            self.0.key_for_url(url)
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 40]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn media_state(storage: Arc<dyn Storage>) -> MediaState {
        MediaState {
            processor: BatchProcessor::new(ImageNormalizer::new(storage.clone(), 750, 85)),
            storage,
            max_images_per_request: 10,
            max_file_size: 10 * 1024 * 1024,
            allowed_extensions: vec!["png".to_string()],
            allowed_content_types: vec!["image/png".to_string()],
        }
    }

    fn upload(name: &str) -> RawUpload {
        RawUpload {
            original_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: png(900, 600),
        }
    }

    fn stored_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_failed_write_aborts_and_removes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStorage::new(dir.path(), "/uploads".to_string())
            .await
            .unwrap();
        let media = media_state(Arc::new(ProcessedWriteFails(local)));

        let result = prepare_images(
            &media,
            vec![upload("a.png"), upload("b.png")],
            &ImageOrderSpec::default(),
        )
        .await;

        assert!(matches!(result, Err(AppError::StorageWriteFailed(_))));
        assert!(stored_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_prepare_images_resolves_cover_key() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStorage::new(dir.path(), "/uploads".to_string())
            .await
            .unwrap();
        let media = media_state(Arc::new(local));
        let spec = ImageOrderSpec {
            declared_order: Vec::new(),
            cover_index: Some(1),
        };

        let prepared = prepare_images(&media, vec![upload("a.png"), upload("b.png")], &spec)
            .await
            .unwrap();

        let keys: Vec<i32> = prepared.images.iter().map(|i| i.sort_order).collect();
        assert_eq!(keys, vec![0, COVER_SORT_KEY]);
        assert_eq!(stored_files(dir.path()).len(), 2);
        assert!(prepared
            .stored_keys
            .iter()
            .all(|k| k.starts_with(PROCESSED_PREFIX)));
    }
}
