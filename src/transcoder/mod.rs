//! External transcoder process management
//!
//! This module handles:
//! - Locating the transcoder binary and failing fast when it is missing
//! - Spawning one child process per conversion with piped stdin/stdout
//! - The duplex conversion stream and its backpressure contract

pub mod spec;
pub mod stream;

pub use spec::ConversionSpec;
pub use stream::{ConversionStream, WriteOutcome};

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};

use crate::error::{IngestError, Result};

/// Handle to the resolved transcoder binary.
///
/// Resolution happens once at startup; a missing binary is a fatal,
/// non-retriable condition reported before any bytes are transferred.
#[derive(Debug, Clone)]
pub struct Transcoder {
    binary: PathBuf,
}

impl Transcoder {
    /// Resolve the transcoder binary at `binary`.
    pub fn resolve(binary: impl Into<PathBuf>) -> Result<Self> {
        let binary = binary.into();
        if !binary.is_file() {
            return Err(IngestError::BinaryMissing(binary));
        }
        Ok(Self { binary })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Spawn one transcoder process with stdin/stdout piped.
    ///
    /// stderr is piped as well so the conversion stream can route it to
    /// diagnostic logging; it never mixes into the output pipe. The child is
    /// killed on drop so aborted pipelines cannot leak processes.
    pub(crate) fn spawn(&self, args: &[String]) -> Result<Child> {
        Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => IngestError::BinaryMissing(self.binary.clone()),
                _ => IngestError::SubprocessIo(format!("spawn {}: {e}", self.binary.display())),
            })
    }
}
