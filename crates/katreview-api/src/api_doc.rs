//! OpenAPI documentation served at `/api/openapi.json` and rendered at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use crate::setup::routes::health;
use katreview_core::models;

/// Registers the `bearer` JWT scheme referenced by write endpoints
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "KatReview API",
        version = "0.1.0",
        description = "Review articles, categories and article images. Uploaded images are normalized to 3:2 JPEG and ordered by the client's imageOrder/coverIndex."
    ),
    paths(
        health::health_check,
        // Categories
        handlers::categories::list_categories,
        handlers::categories::get_category,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
        // Articles
        handlers::articles::list_articles,
        handlers::articles::latest_articles,
        handlers::articles::articles_by_category,
        handlers::articles::get_article,
        handlers::articles::related_articles,
        handlers::article_write::create_article,
        handlers::article_write::update_article,
        handlers::article_write::delete_article,
        // Search
        handlers::search::search_articles,
        // Auth
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::verify,
        handlers::auth::me,
    ),
    components(
        schemas(
            models::CategoryRequest,
            models::CategoryResponse,
            models::ArticleResponse,
            models::ArticleListResponse,
            models::AuthorResponse,
            models::CategorySummary,
            models::ArticleImageResponse,
            models::UserResponse,
            models::UserRole,
            handlers::MessageResponse,
            handlers::auth::RegisterRequest,
            handlers::auth::LoginRequest,
            handlers::auth::AuthResponse,
            handlers::auth::AuthData,
            health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "articles", description = "Article reads and editor writes with image uploads"),
        (name = "categories", description = "Article categories"),
        (name = "search", description = "Substring search over articles"),
        (name = "auth", description = "Registration, login and token checks"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
