//! Shared key generation for stored article images.

use katreview_core::constants::PROCESSED_PREFIX;
use uuid::Uuid;

const MAX_NAME_LENGTH: usize = 120;

/// Key for a raw upload before normalization: `{uuid}-{name}`.
pub fn staged_key(original_name: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_filename(original_name))
}

/// Key for a normalized JPEG: `processed-{uuid}-{stem}.jpg`.
pub fn processed_key(original_name: &str) -> String {
    format!(
        "{}{}-{}.jpg",
        PROCESSED_PREFIX,
        Uuid::new_v4(),
        file_stem(&sanitize_filename(original_name))
    )
}

/// Whether a key (or URL ending in a key) was written by the normalizer.
pub fn is_processed(key_or_url: &str) -> bool {
    key_or_url
        .rsplit('/')
        .next()
        .is_some_and(|name| name.starts_with(PROCESSED_PREFIX))
}

/// Reduce an uploaded filename to a safe key component.
///
/// Directory parts are dropped, characters other than ASCII alphanumerics,
/// `.`, `-` and `_` become `_`, and `..` sequences are removed.
pub fn sanitize_filename(filename: &str) -> String {
    let name_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let mut sanitized: String = name_only
        .chars()
        .take(MAX_NAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", ".");
    }
    let sanitized = sanitized.trim_matches('.').to_string();

    if sanitized.trim_matches('_').is_empty() {
        return "image".to_string();
    }

    sanitized
}

fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_key_shape() {
        let key = processed_key("Ảnh bìa.PNG");
        assert!(key.starts_with("processed-"));
        assert!(key.ends_with("-_nh_b_a.jpg"));
        assert!(is_processed(&key));
        assert!(is_processed(&format!("/uploads/{}", key)));
    }

    #[test]
    fn test_staged_keys_are_unique() {
        let a = staged_key("cat.jpg");
        let b = staged_key("cat.jpg");
        assert_ne!(a, b);
        assert!(a.ends_with("-cat.jpg"));
        assert!(!is_processed(&a));
    }

    #[test]
    fn test_sanitize_strips_paths_and_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\photos\\a..b.jpg"), "a.b.jpg");
        assert_eq!(sanitize_filename("..."), "image");
        assert_eq!(sanitize_filename("đđđ"), "image");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("photo.final.jpeg"), "photo.final");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }
}
