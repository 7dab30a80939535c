//! Query-string limits shared by the listing endpoints

use katreview_core::constants::MAX_PAGE_SIZE;

/// `limit` clamped to `1..=MAX_PAGE_SIZE`, `default` when absent or non-positive
pub fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    match limit {
        Some(l) if l > 0 => l.min(MAX_PAGE_SIZE),
        _ => default,
    }
}

/// 1-based page number, `1` when absent or non-positive
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.filter(|p| *p > 0).unwrap_or(1)
}

/// Row offset of `page`; saturates instead of overflowing on huge pages
pub fn page_offset(page: i64, limit: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 10), 10);
        assert_eq!(clamp_limit(Some(0), 10), 10);
        assert_eq!(clamp_limit(Some(-3), 5), 5);
        assert_eq!(clamp_limit(Some(4), 10), 4);
        assert_eq!(clamp_limit(Some(5000), 10), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(None), 1);
        assert_eq!(clamp_page(Some(0)), 1);
        assert_eq!(clamp_page(Some(3)), 3);
    }

    #[test]
    fn test_page_offset_saturates() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);

        let page = clamp_page(Some(i64::MAX));
        assert_eq!(page_offset(page, 10), i64::MAX);
        assert_eq!(page_offset(page, MAX_PAGE_SIZE), i64::MAX);
    }
}
