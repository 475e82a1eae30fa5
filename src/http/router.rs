//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Snapshot ingestion
        .route("/snapshots", post(handlers::create_batch))
        .route("/batches/{batch_id}", get(handlers::get_batch_status))
        .route("/batches/{batch_id}/logs", get(handlers::stream_batch_logs))
        // Session configuration
        .route("/session", get(handlers::get_session))
        .route("/session/tolerance", put(handlers::set_tolerance))
        .route("/session/active-dates", put(handlers::set_active_dates))
        .route(
            "/session/active-dates/invert",
            post(handlers::invert_active_dates),
        )
        .route(
            "/session/active-dates/{date}/toggle",
            post(handlers::toggle_date),
        )
        .route("/session/pivot", put(handlers::set_pivot))
        .route("/session/split", put(handlers::set_split))
        // Derived views
        .route("/table", get(handlers::get_table))
        .route("/selection", post(handlers::select_group))
        .route("/series", get(handlers::get_series))
        .route("/series/lock", post(handlers::lock_series))
        .route("/series/lock", delete(handlers::clear_locked_series))
        .route("/map/markers", get(handlers::get_markers))
        .route("/centroids/{name}", get(handlers::get_centroid_profile))
        .route("/export.csv", get(handlers::export_csv));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Allow multi-file snapshot batches in one upload.
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
