//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{
    download_csv, download_json, health, results, run_pipeline, update_fields,
};
use crate::middleware::auth::auth_middleware;
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    let protected = Router::new()
        // Run one extraction pass
        .route("/api/run", post(run_pipeline))
        // Replace the active field schema
        .route("/api/fields", post(update_fields))
        // Latest results
        .route("/api/results", get(results))
        // Downloads
        .route("/download/json", get(download_json))
        .route("/download/csv", get(download_csv))
        .route_layer(middleware::from_fn(auth_middleware));

    Router::new()
        // Health check
        .route("/health", get(health))
        .merge(protected)
}
