//! Router assembly.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::handlers;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Anything that is not an API route is served from the public directory;
    // the root path resolves to its index document.
    let public = ServeDir::new(&state.config.public_dir);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ask", post(handlers::ask))
        .route("/complete", post(handlers::complete))
        .fallback_service(public)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
