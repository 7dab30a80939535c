//! Which persisted images an update removes.

/// URLs from `existing` that an update must delete.
///
/// `kept = None` means the client did not ask for replacement, so nothing is
/// removed. Otherwise every existing URL missing from `kept` is removed, once,
/// in `existing` order.
pub fn plan_removals(existing: &[String], kept: Option<&[String]>) -> Vec<String> {
    let Some(kept) = kept else {
        return Vec::new();
    };

    let mut removals: Vec<String> = Vec::new();
    for url in existing {
        if !kept.contains(url) && !removals.contains(url) {
            removals.push(url.clone());
        }
    }
    removals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_only_unkept_images_removed() {
        let existing = urls(&["a", "b", "c"]);
        let kept = urls(&["a", "c"]);
        assert_eq!(plan_removals(&existing, Some(kept.as_slice())), urls(&["b"]));
    }

    #[test]
    fn test_no_keep_list_removes_nothing() {
        assert!(plan_removals(&urls(&["a", "b"]), None).is_empty());
    }

    #[test]
    fn test_empty_keep_list_removes_everything() {
        let kept: Vec<String> = Vec::new();
        assert_eq!(plan_removals(&urls(&["a", "b"]), Some(kept.as_slice())), urls(&["a", "b"]));
    }

    #[test]
    fn test_idempotent_once_applied() {
        let kept = urls(&["a", "c"]);
        let first = plan_removals(&urls(&["a", "b", "c"]), Some(kept.as_slice()));
        assert_eq!(first, urls(&["b"]));
        assert!(plan_removals(&urls(&["a", "c"]), Some(kept.as_slice())).is_empty());
    }

    #[test]
    fn test_duplicate_urls_planned_once() {
        let kept: Vec<String> = Vec::new();
        assert_eq!(plan_removals(&urls(&["x", "x"]), Some(kept.as_slice())), urls(&["x"]));
    }
}
