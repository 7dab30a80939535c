//! Sort keys for an upload batch.
//!
//! Clients send the display order of the files they uploaded (`imageOrder`, a
//! JSON array of upload positions) and optionally which one is the cover
//! (`coverIndex`). Each uploaded image gets an integer sort key; the cover gets
//! [`COVER_SORT_KEY`] so it reads first.

use katreview_core::constants::COVER_SORT_KEY;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderSpecError {
    #[error("imageOrder must be a JSON array of non-negative integers")]
    MalformedOrder,

    #[error("coverIndex must be a non-negative integer")]
    MalformedCover,

    #[error("keptImageUrls must be a JSON array of strings")]
    MalformedKeptUrls,

    #[error("imageOrder index {index} is out of range for {count} uploaded images")]
    OrderIndexOutOfRange { index: usize, count: usize },

    #[error("imageOrder lists index {0} more than once")]
    DuplicateIndex(usize),

    #[error("coverIndex {index} is out of range for {count} uploaded images")]
    CoverOutOfRange { index: usize, count: usize },
}

/// Client ordering input for one upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOrderSpec {
    pub declared_order: Vec<usize>,
    pub cover_index: Option<usize>,
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null" && *s != "undefined")
}

impl ImageOrderSpec {
    /// Parse the raw multipart fields. Absent, empty or `null` fields mean "not
    /// given".
    pub fn parse(image_order: Option<&str>, cover_index: Option<&str>) -> Result<Self, OrderSpecError> {
        let declared_order = match present(image_order) {
            Some(raw) => serde_json::from_str::<Vec<usize>>(raw)
                .map_err(|_| OrderSpecError::MalformedOrder)?,
            None => Vec::new(),
        };

        let cover_index = match present(cover_index) {
            Some(raw) => Some(
                raw.parse::<usize>()
                    .map_err(|_| OrderSpecError::MalformedCover)?,
            ),
            None => None,
        };

        Ok(Self {
            declared_order,
            cover_index,
        })
    }

    /// Check the ordering input against the number of uploaded files. Partial declared
    /// orders are fine; unknown or repeated positions are not.
    pub fn validate(&self, count: usize) -> Result<(), OrderSpecError> {
        let mut seen = HashSet::with_capacity(self.declared_order.len());
        for &index in &self.declared_order {
            if index >= count {
                return Err(OrderSpecError::OrderIndexOutOfRange { index, count });
            }
            if !seen.insert(index) {
                return Err(OrderSpecError::DuplicateIndex(index));
            }
        }

        if let Some(index) = self.cover_index {
            if index >= count {
                return Err(OrderSpecError::CoverOutOfRange { index, count });
            }
        }

        Ok(())
    }
}

/// Sort key for each of `count` uploaded images, indexed by upload position.
///
/// Declared images take their position in the declared order; the rest follow
/// in upload order. The cover, when in range, gets [`COVER_SORT_KEY`].
pub fn resolve_order(count: usize, spec: &ImageOrderSpec) -> Vec<i32> {
    let declared = &spec.declared_order;

    let mut keys: Vec<i32> = (0..count)
        .map(|i| {
            let key = declared
                .iter()
                .position(|&d| d == i)
                .unwrap_or(declared.len() + i);
            key as i32
        })
        .collect();

    if let Some(cover) = spec.cover_index.filter(|&k| k < count) {
        keys[cover] = COVER_SORT_KEY;
    }

    keys
}

/// Parse `keptImageUrls`. An absent field keeps nothing.
pub fn parse_kept_urls(raw: Option<&str>) -> Result<Vec<String>, OrderSpecError> {
    match present(raw) {
        Some(raw) => {
            serde_json::from_str::<Vec<String>>(raw).map_err(|_| OrderSpecError::MalformedKeptUrls)
        }
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(order: &[usize], cover: Option<usize>) -> ImageOrderSpec {
        ImageOrderSpec {
            declared_order: order.to_vec(),
            cover_index: cover,
        }
    }

    #[test]
    fn test_declared_order_with_cover() {
        assert_eq!(resolve_order(3, &spec(&[2, 0, 1], Some(1))), vec![1, -1, 0]);
    }

    #[test]
    fn test_no_declared_order_is_upload_order() {
        assert_eq!(resolve_order(4, &spec(&[], None)), vec![0, 1, 2, 3]);
        assert_eq!(resolve_order(0, &spec(&[], Some(0))), Vec::<i32>::new());
    }

    #[test]
    fn test_partial_order_appends_rest() {
        // 3 first, then 1; 0 and 2 follow in upload order
        assert_eq!(resolve_order(4, &spec(&[3, 1], None)), vec![2, 1, 4, 0]);
    }

    #[test]
    fn test_cover_sorts_first() {
        for cover in 0..5 {
            let keys = resolve_order(5, &spec(&[4, 3, 2, 1, 0], Some(cover)));
            for (j, key) in keys.iter().enumerate() {
                if j != cover {
                    assert!(keys[cover] < *key);
                }
            }
        }
    }

    #[test]
    fn test_cover_out_of_range_is_ignored_by_resolver() {
        assert_eq!(resolve_order(2, &spec(&[], Some(7))), vec![0, 1]);
    }

    #[test]
    fn test_parse() {
        let parsed = ImageOrderSpec::parse(Some("[2,0,1]"), Some("1")).unwrap();
        assert_eq!(parsed, spec(&[2, 0, 1], Some(1)));

        let parsed = ImageOrderSpec::parse(Some(""), Some("null")).unwrap();
        assert_eq!(parsed, ImageOrderSpec::default());

        let parsed = ImageOrderSpec::parse(None, Some(" 0 ")).unwrap();
        assert_eq!(parsed.cover_index, Some(0));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert_eq!(
            ImageOrderSpec::parse(Some("[1, \"a\"]"), None),
            Err(OrderSpecError::MalformedOrder)
        );
        assert_eq!(
            ImageOrderSpec::parse(Some("[-1]"), None),
            Err(OrderSpecError::MalformedOrder)
        );
        assert_eq!(
            ImageOrderSpec::parse(Some("{}"), None),
            Err(OrderSpecError::MalformedOrder)
        );
        assert_eq!(
            ImageOrderSpec::parse(None, Some("first")),
            Err(OrderSpecError::MalformedCover)
        );
        assert_eq!(
            ImageOrderSpec::parse(None, Some("-1")),
            Err(OrderSpecError::MalformedCover)
        );
    }

    #[test]
    fn test_validate() {
        assert!(spec(&[2, 0, 1], Some(1)).validate(3).is_ok());
        assert!(spec(&[1], None).validate(3).is_ok());
        assert_eq!(
            spec(&[0, 3], None).validate(3),
            Err(OrderSpecError::OrderIndexOutOfRange { index: 3, count: 3 })
        );
        assert_eq!(
            spec(&[0, 0], None).validate(3),
            Err(OrderSpecError::DuplicateIndex(0))
        );
        assert_eq!(
            spec(&[], Some(3)).validate(3),
            Err(OrderSpecError::CoverOutOfRange { index: 3, count: 3 })
        );
    }

    #[test]
    fn test_parse_kept_urls() {
        assert_eq!(
            parse_kept_urls(Some(r#"["/uploads/a.jpg","/uploads/c.jpg"]"#)).unwrap(),
            vec!["/uploads/a.jpg".to_string(), "/uploads/c.jpg".to_string()]
        );
        assert_eq!(parse_kept_urls(None).unwrap(), Vec::<String>::new());
        assert_eq!(parse_kept_urls(Some("[]")).unwrap(), Vec::<String>::new());
        assert_eq!(
            parse_kept_urls(Some("[1,2]")),
            Err(OrderSpecError::MalformedKeptUrls)
        );
    }
}
