//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory artifact files are written to
    pub root_dir: PathBuf,

    /// Maximum accepted upload body size in megabytes
    pub max_upload_mb: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("/tmp/sound-ingest"),
            max_upload_mb: 50,
        }
    }
}

impl StorageConfig {
    /// Get maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Audio conversion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate the stored copy and the peak pass are resampled to
    pub sample_rate: u32,

    /// Channel count for the stored copy
    pub channels: u16,

    /// Container/codec tag for the stored lossless copy
    pub lossless_format: String,

    /// Peak bytes emitted per second of audio
    pub peaks_per_second: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            lossless_format: "flac".to_string(),
            peaks_per_second: 40,
        }
    }
}

/// External transcoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to the transcoder binary, relative to the working directory
    pub binary: PathBuf,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("bin/ffmpeg/ffmpeg"),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Audio configuration
    pub audio: AudioConfig,

    /// Transcoder configuration
    pub transcoder: TranscoderConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            storage: StorageConfig::default(),
            audio: AudioConfig::default(),
            transcoder: TranscoderConfig::default(),
            cors_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
