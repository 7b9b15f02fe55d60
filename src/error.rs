use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the ingest server
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("transcoder binary is not present at {0}")]
    BinaryMissing(PathBuf),

    #[error("unsupported input format: {0}")]
    UnsupportedInputFormat(String),

    #[error("transcoder I/O error: {0}")]
    SubprocessIo(String),

    #[error("storage write error: {0}")]
    StorageWrite(String),

    #[error("upload stream error: {0}")]
    UploadStream(String),

    #[error("sound not found: {0}")]
    SoundNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, IngestError>;
