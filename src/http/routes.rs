//! Axum router configuration

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{
    delete_sound, health_check, list_sounds, sound_audio, sound_peaks, store_stats, upload_sound,
    version_check,
};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Browser upload pages need CORS for both the upload POST and the
    // artifact reads.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::ORIGIN,
        ])
        .max_age(Duration::from_secs(3600));

    let max_body = state.config.storage.max_upload_bytes();

    Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Debug endpoints
        .route("/debug/store", get(store_stats))
        // Sounds
        .route("/sounds", get(list_sounds).post(upload_sound))
        .route("/sounds/{id}", delete(delete_sound))
        .route("/sounds/{id}/audio", get(sound_audio))
        .route("/sounds/{id}/peaks", get(sound_peaks))
        // Middleware
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}
