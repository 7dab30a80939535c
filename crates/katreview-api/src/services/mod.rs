pub mod article_images;
pub mod articles;
