//! HTTP request handlers
//!
//! Implements the upload endpoint and artifact read endpoints.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::error::IngestError;
use crate::formats;
use crate::pipeline::UploadPipeline;
use crate::state::{AppState, SoundRecord};
use crate::storage::StoredArtifact;

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    NotFound(String),
    InternalError(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            HttpError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, body).into_response()
    }
}

impl From<IngestError> for HttpError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::UnsupportedInputFormat(_) | IngestError::UploadStream(_) => {
                HttpError::BadRequest(err.to_string())
            }
            IngestError::SoundNotFound(_) => HttpError::NotFound(err.to_string()),
            _ => HttpError::InternalError(err.to_string()),
        }
    }
}

/// Query parameters for the upload endpoint
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Display name for the sound; defaults to its id
    pub name: Option<String>,
}

/// JSON summary of an ingested sound
#[derive(Debug, Serialize)]
pub struct SoundResponse {
    pub id: String,
    pub name: String,
    pub input_format: String,
    pub audio_bytes: u64,
    pub peak_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl SoundResponse {
    fn from_record(record: &SoundRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            input_format: record.input_format.clone(),
            audio_bytes: record.audio.size_bytes,
            peak_bytes: record.peaks.size_bytes,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// List of ingested sounds
#[derive(Debug, Serialize)]
pub struct SoundListResponse {
    pub count: usize,
    pub sounds: Vec<SoundResponse>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("sound-ingest v", env!("CARGO_PKG_VERSION"))
}

/// Upload a sound
/// POST /sounds?name=...
///
/// The request body is the raw audio; its Content-Type picks the input
/// format. An unusable Content-Type is rejected before any body byte is
/// consumed.
pub async fn upload_sound(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, HttpError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let input_format = formats::format_for_mime(content_type)
        .ok_or_else(|| HttpError::from(IngestError::UnsupportedInputFormat(content_type.to_string())))?;

    let stream = Box::pin(
        body.into_data_stream()
            .map(|r| r.map_err(|e| IngestError::UploadStream(e.to_string()))),
    );

    let pipeline = UploadPipeline::new(&state.transcoder, &state.store, &state.config.audio);
    let output = pipeline.run(input_format, stream).await?;

    let id = Uuid::new_v4().to_string();
    let record = state.register_sound(SoundRecord {
        id: id.clone(),
        name: params.name.unwrap_or_else(|| id.clone()),
        audio: output.audio,
        peaks: output.peaks,
        input_format: input_format.to_string(),
        uploaded_at: Utc::now(),
    });

    tracing::info!(
        id = %record.id,
        audio_bytes = record.audio.size_bytes,
        peak_bytes = record.peaks.size_bytes,
        "sound ingested"
    );

    Ok((StatusCode::CREATED, Json(SoundResponse::from_record(&record))).into_response())
}

/// List all ingested sounds
/// GET /sounds
pub async fn list_sounds(State(state): State<Arc<AppState>>) -> Json<SoundListResponse> {
    let sounds: Vec<_> = state
        .sounds
        .iter()
        .map(|r| SoundResponse::from_record(&r))
        .collect();

    Json(SoundListResponse {
        count: sounds.len(),
        sounds,
    })
}

/// Stream the lossless audio artifact
/// GET /sounds/{id}/audio
pub async fn sound_audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let record = state
        .get_sound(&id)
        .ok_or_else(|| HttpError::from(IngestError::SoundNotFound(id.clone())))?;

    serve_artifact(&record.audio, formats::mime_for_extension(record.audio.extension())).await
}

/// Stream the raw peak bytes
/// GET /sounds/{id}/peaks
pub async fn sound_peaks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let record = state
        .get_sound(&id)
        .ok_or_else(|| HttpError::from(IngestError::SoundNotFound(id.clone())))?;

    serve_artifact(&record.peaks, "application/octet-stream").await
}

/// Delete a sound and both of its artifacts
/// DELETE /sounds/{id}
pub async fn delete_sound(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let record = state
        .remove_sound(&id)
        .ok_or_else(|| HttpError::from(IngestError::SoundNotFound(id.clone())))?;

    state.store.remove(&record.audio).await;
    state.store.remove(&record.peaks).await;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Debug endpoint - registry and storage statistics
pub async fn store_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sound_count = state.sounds.len();
    let audio_bytes: u64 = state.sounds.iter().map(|r| r.audio.size_bytes).sum();
    let peak_bytes: u64 = state.sounds.iter().map(|r| r.peaks.size_bytes).sum();

    Json(serde_json::json!({
        "sound_count": sound_count,
        "audio_bytes": audio_bytes,
        "peak_bytes": peak_bytes,
        "store_root": state.store.root().display().to_string(),
    }))
}

/// Serve one stored artifact byte for byte
async fn serve_artifact(
    artifact: &StoredArtifact,
    content_type: &'static str,
) -> Result<Response, HttpError> {
    let file = match tokio::fs::File::open(&artifact.path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HttpError::NotFound(format!(
                "artifact missing: {}",
                artifact.path.display()
            )));
        }
        Err(e) => return Err(HttpError::InternalError(e.to_string())),
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(artifact.size_bytes));

    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            HttpError::from(IngestError::UnsupportedInputFormat("text/plain".into())),
            HttpError::BadRequest(_)
        ));
        assert!(matches!(
            HttpError::from(IngestError::SoundNotFound("x".into())),
            HttpError::NotFound(_)
        ));
        assert!(matches!(
            HttpError::from(IngestError::SubprocessIo("pipe".into())),
            HttpError::InternalError(_)
        ));
        assert!(matches!(
            HttpError::from(IngestError::StorageWrite("disk".into())),
            HttpError::InternalError(_)
        ));
    }

    #[test]
    fn test_sound_response_from_record() {
        let record = SoundRecord {
            id: "abc".to_string(),
            name: "riff".to_string(),
            audio: StoredArtifact {
                path: "/tmp/abc.flac".into(),
                size_bytes: 1234,
            },
            peaks: StoredArtifact {
                path: "/tmp/abc.peaks".into(),
                size_bytes: 56,
            },
            input_format: "wav".to_string(),
            uploaded_at: Utc::now(),
        };
        let response = SoundResponse::from_record(&record);
        assert_eq!(response.id, "abc");
        assert_eq!(response.audio_bytes, 1234);
        assert_eq!(response.peak_bytes, 56);
        assert_eq!(response.input_format, "wav");
    }
}
