//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // Registration, login and the health probe are reachable without a token.
    let public_routes = Router::new()
        .route("/v1/register", post(handlers::register))
        .route("/v1/auth", post(handlers::login))
        .route("/v1/ping", get(handlers::ping));

    let file_routes = Router::new()
        .route("/v1/files", get(handlers::list_files))
        .route("/v1/files/upload", post(handlers::upload_file))
        .route("/v1/files/download", get(handlers::download_file))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        // Uploads stream to disk, so the default in-memory body cap does not apply.
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .merge(public_routes)
        .merge(file_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
