//! Route configuration and setup.
//!
//! Public reads and login live next to the editor-only write routes; both share
//! path shapes so axum merges them per method.

pub mod health;

use crate::auth::middleware::{auth_middleware, require_editor};
use crate::constants::API_PREFIX;
use crate::handlers::{article_write, articles, auth, categories, search};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use katreview_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Headroom for the text fields of a multipart article form
const FORM_FIELDS_ALLOWANCE: usize = 1024 * 1024;

/// Build the full application router
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let config = &state.config;
    let cors = setup_cors(config)?;

    let editor_routes = editor_routes()
        .layer(from_fn(require_editor))
        .layer(from_fn_with_state(state.auth.jwt.clone(), auth_middleware));
    let session_routes = session_routes()
        .layer(from_fn_with_state(state.auth.jwt.clone(), auth_middleware));

    let api = public_routes().merge(editor_routes).merge(session_routes);

    let body_limit = config
        .max_file_size_bytes()
        .saturating_mul(config.max_images_per_request())
        .saturating_add(FORM_FIELDS_ALLOWANCE);

    let request_timeout_secs = config.request_timeout_secs().max(1);
    tracing::info!(request_timeout_secs, body_limit, "HTTP limits configured");

    let mut app = Router::new()
        .nest(API_PREFIX, api)
        .with_state(state.clone())
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"));

    // Local uploads are only served here when published under a path of this host
    let uploads_path = config.uploads_base_url().trim_end_matches('/');
    if uploads_path.starts_with('/') && !uploads_path.is_empty() {
        app = app.nest_service(uploads_path, ServeDir::new(config.uploads_dir()));
    }

    let app = app
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_secs)))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        )
        .route("/categories", get(categories::list_categories))
        .route("/categories/{slug}", get(categories::get_category))
        .route("/articles", get(articles::list_articles))
        .route("/articles/latest", get(articles::latest_articles))
        .route("/articles/category/{slug}", get(articles::articles_by_category))
        .route("/articles/{slug}", get(articles::get_article))
        .route("/articles/{slug}/related", get(articles::related_articles))
        .route("/search", get(search::search_articles))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Content writes. The `{slug}` segment carries the numeric id here; it keeps
/// the same name as the read routes so the two routers merge.
fn editor_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/articles", post(article_write::create_article))
        .route(
            "/articles/{slug}",
            axum::routing::put(article_write::update_article)
                .delete(article_write::delete_article),
        )
        .route("/categories", post(categories::create_category))
        .route(
            "/categories/{slug}",
            axum::routing::put(categories::update_category)
                .delete(categories::delete_category),
        )
}

fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/verify", get(auth::verify))
        .route("/auth/me", get(auth::me))
}
