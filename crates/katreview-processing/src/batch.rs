use crate::normalizer::{ImageNormalizer, ProcessedImage, UploadedFile};
use katreview_core::models::NewArticleImage;

/// Result of normalizing one file of a batch.
#[derive(Debug, Clone)]
pub enum NormalizeOutcome {
    Normalized(ProcessedImage),
    /// The image could not be decoded or encoded; the staged original is
    /// published as-is.
    PassedThrough {
        original: UploadedFile,
        reason: String,
    },
    /// Nothing usable was produced for this file.
    Failed {
        original: UploadedFile,
        reason: String,
    },
}

impl NormalizeOutcome {
    /// Public URL to persist, if the outcome produced one.
    pub fn url(&self) -> Option<&str> {
        match self {
            NormalizeOutcome::Normalized(image) => Some(&image.url),
            NormalizeOutcome::PassedThrough { original, .. } => Some(&original.url),
            NormalizeOutcome::Failed { .. } => None,
        }
    }

    pub fn original_name(&self) -> &str {
        match self {
            NormalizeOutcome::Normalized(image) => &image.original_name,
            NormalizeOutcome::PassedThrough { original, .. }
            | NormalizeOutcome::Failed { original, .. } => &original.original_name,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, NormalizeOutcome::Failed { .. })
    }

    /// Storage keys this outcome left behind, for cleanup when the request is
    /// abandoned.
    pub fn stored_keys(&self) -> Vec<String> {
        match self {
            NormalizeOutcome::Normalized(image) => vec![image.key.clone()],
            NormalizeOutcome::PassedThrough { original, .. }
            | NormalizeOutcome::Failed { original, .. } => vec![original.key.clone()],
        }
    }

    /// Row to insert for this outcome with the given sort key. `None` for
    /// failed outcomes.
    pub fn to_new_image(&self, caption: Option<String>, sort_order: i32) -> Option<NewArticleImage> {
        let url = self.url()?;
        Some(NewArticleImage::new(
            url.to_string(),
            self.original_name(),
            caption,
            sort_order,
        ))
    }
}

/// Runs the normalizer over every file of an upload batch.
#[derive(Clone)]
pub struct BatchProcessor {
    normalizer: ImageNormalizer,
}

impl BatchProcessor {
    pub fn new(normalizer: ImageNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &ImageNormalizer {
        &self.normalizer
    }

    /// Normalize files one at a time. The result has one outcome per input, in
    /// input order; a failing file never aborts the rest of the batch.
    #[tracing::instrument(skip(self, files), fields(file_count = files.len()))]
    pub async fn process_all(&self, files: Vec<UploadedFile>) -> Vec<NormalizeOutcome> {
        let mut outcomes = Vec::with_capacity(files.len());

        for file in files {
            let outcome = match self.normalizer.normalize(&file).await {
                Ok(processed) => NormalizeOutcome::Normalized(processed),
                Err(e) if e.keeps_original() => {
                    tracing::warn!(
                        error = %e,
                        file = %file.original_name,
                        "Image normalization failed, keeping original upload"
                    );
                    NormalizeOutcome::PassedThrough {
                        reason: e.to_string(),
                        original: file,
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        file = %file.original_name,
                        "Image normalization failed"
                    );
                    NormalizeOutcome::Failed {
                        reason: e.to_string(),
                        original: file,
                    }
                }
            };
            outcomes.push(outcome);
        }

        let normalized = outcomes
            .iter()
            .filter(|o| matches!(o, NormalizeOutcome::Normalized(_)))
            .count();
        tracing::info!(
            normalized,
            total = outcomes.len(),
            "Upload batch processed"
        );

        outcomes
    }
}
