//! Sound Ingest Server
//!
//! Streams uploaded audio through an external transcoder subprocess into a
//! lossless stored copy, then derives a peak-amplitude byte artifact for
//! waveform rendering. Uploads and artifact reads never buffer whole files
//! in memory.

#![allow(dead_code)]

mod config;
mod error;
mod formats;
mod http;
mod pipeline;
mod state;
mod storage;
mod transcoder;

#[cfg(test)]
mod integration;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::error::{IngestError, Result};
use crate::http::create_router;
use crate::state::AppState;
use crate::storage::ArtifactStore;
use crate::transcoder::Transcoder;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "sound-ingest";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    tracing::info!("{} v{} starting", APP_NAME, VERSION);

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        match ServerConfig::from_file(&config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    "Failed to load config file {}: {}. Using defaults.",
                    config_path,
                    e
                );
                ServerConfig::default()
            }
        }
    } else {
        ServerConfig::default()
    };
    tracing::info!("Configuration loaded: {:?}", config);

    // A missing transcoder binary is fatal before any upload is accepted
    let transcoder = Transcoder::resolve(&config.transcoder.binary)?;
    tracing::info!("Transcoder binary: {}", transcoder.binary().display());

    let store = ArtifactStore::open(&config.storage.root_dir)?;
    tracing::info!("Artifact store at {}", store.root().display());

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), transcoder, store));

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| IngestError::Config(format!("invalid listen address: {e}")))?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging with tracing
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sound_ingest=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
