use axum::{routing::get, Router};

use super::types::ApiError;

/// Wraps the todo item routes with a health probe and a JSON 404 for unknown paths.
pub fn app(items: Router) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(items)
        .fallback(|| async { ApiError::not_found("Not found.") })
}
