//! Application state management
//!
//! Holds the server configuration, the resolved transcoder handle, the
//! artifact store and the in-memory sound registry. Durable metadata
//! persistence is an external collaborator's job; the registry only maps
//! sound ids to their stored artifacts for serving and deletion.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::{ArtifactStore, StoredArtifact};
use crate::transcoder::Transcoder;

/// One ingested sound and its two artifacts
#[derive(Debug)]
pub struct SoundRecord {
    pub id: String,
    pub name: String,
    /// Lossless re-encoded audio, the canonical playable copy
    pub audio: StoredArtifact,
    /// Raw peak-amplitude bytes for waveform rendering
    pub peaks: StoredArtifact,
    /// Format tag the upload was declared as
    pub input_format: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub transcoder: Transcoder,
    pub store: ArtifactStore,
    pub sounds: DashMap<String, Arc<SoundRecord>>,
}

impl AppState {
    pub fn new(config: ServerConfig, transcoder: Transcoder, store: ArtifactStore) -> Self {
        Self {
            config,
            transcoder,
            store,
            sounds: DashMap::new(),
        }
    }

    /// Register a sound after its pipeline completed
    pub fn register_sound(&self, record: SoundRecord) -> Arc<SoundRecord> {
        let record = Arc::new(record);
        self.sounds.insert(record.id.clone(), record.clone());
        record
    }

    /// Get a sound by id
    pub fn get_sound(&self, id: &str) -> Option<Arc<SoundRecord>> {
        self.sounds.get(id).map(|r| r.clone())
    }

    /// Remove a sound record, returning it so its artifacts can be deleted
    pub fn remove_sound(&self, id: &str) -> Option<Arc<SoundRecord>> {
        self.sounds.remove(id).map(|(_, record)| record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_state() -> AppState {
        let dir = std::env::temp_dir().join(format!("sound-ingest-state-{}", uuid::Uuid::new_v4()));
        let store = ArtifactStore::open(&dir).expect("open store");
        let transcoder = Transcoder::resolve("/bin/cat").expect("resolve");
        AppState::new(ServerConfig::default(), transcoder, store)
    }

    fn test_record(id: &str) -> SoundRecord {
        SoundRecord {
            id: id.to_string(),
            name: "clip".to_string(),
            audio: StoredArtifact {
                path: PathBuf::from("/tmp/a.flac"),
                size_bytes: 4,
            },
            peaks: StoredArtifact {
                path: PathBuf::from("/tmp/a.peaks"),
                size_bytes: 1,
            },
            input_format: "wav".to_string(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_register_and_get() {
        let state = test_state();
        state.register_sound(test_record("s1"));
        let record = state.get_sound("s1").expect("registered");
        assert_eq!(record.name, "clip");
        assert!(state.get_sound("missing").is_none());
    }

    #[test]
    fn test_remove_returns_record() {
        let state = test_state();
        state.register_sound(test_record("s2"));
        let removed = state.remove_sound("s2").expect("present");
        assert_eq!(removed.id, "s2");
        assert!(state.get_sound("s2").is_none());
    }
}
