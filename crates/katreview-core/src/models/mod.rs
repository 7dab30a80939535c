pub mod article;
pub mod article_image;
pub mod category;
pub mod user;

pub use article::{
    ArticleFields, ArticleFilter, ArticleListResponse, ArticleResponse, ArticleRow,
    AuthorResponse, CategorySummary,
};
pub use article_image::{ArticleImage, ArticleImageResponse, NewArticleImage};
pub use category::{Category, CategoryRequest, CategoryResponse};
pub use user::{User, UserResponse, UserRole};
