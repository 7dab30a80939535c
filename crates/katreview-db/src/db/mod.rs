//! Database repositories for data access layer
//!
//! Write paths that must be atomic take a `&mut Transaction` so callers can
//! group several repository calls into one unit of work.

pub mod article;
pub mod article_image;
pub mod category;
pub mod user;

pub use article::ArticleRepository;
pub use article_image::ArticleImageRepository;
pub use category::CategoryRepository;
pub use user::UserRepository;

use katreview_core::AppError;

/// Map a unique-constraint violation to `Conflict`, anything else to a database error.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside a LIKE pattern.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("điện thoại"), "điện thoại");
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
    }
}
