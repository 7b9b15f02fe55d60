//! Two-pass upload pipeline
//!
//! Pass 1 streams the inbound bytes through a conversion to the lossless
//! storage format and onto disk. Only after that artifact is flushed does
//! pass 2 read it back, decode it to mono unsigned 8-bit PCM through a
//! second conversion, decimate the samples to peak bytes and store those.
//! A failure in either pass kills that pass's subprocess, removes its
//! partial artifact and surfaces a single error; a completed pass-1
//! artifact is retained when pass 2 fails.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;

use super::peaks::PeakExtractor;
use crate::config::AudioConfig;
use crate::error::{IngestError, Result};
use crate::storage::{ArtifactStore, StoredArtifact};
use crate::transcoder::{ConversionSpec, ConversionStream, Transcoder};

const COPY_BUF_SIZE: usize = 64 * 1024;

/// Pipeline stages, advanced strictly in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineStage {
    Receiving,
    EncodingLossless,
    LosslessComplete,
    ExtractingPeaks,
    Complete,
    Failed,
}

/// Both artifacts produced by a successful upload
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub audio: StoredArtifact,
    pub peaks: StoredArtifact,
}

/// Coordinates the two conversion passes for one upload.
///
/// Each upload gets its own pipeline instance; subprocesses, pipes and files
/// are owned exclusively by the pass that created them, so concurrent
/// uploads never share mutable state.
pub struct UploadPipeline<'a> {
    transcoder: &'a Transcoder,
    store: &'a ArtifactStore,
    audio: &'a AudioConfig,
}

impl<'a> UploadPipeline<'a> {
    pub fn new(transcoder: &'a Transcoder, store: &'a ArtifactStore, audio: &'a AudioConfig) -> Self {
        Self {
            transcoder,
            store,
            audio,
        }
    }

    /// Run both passes over the inbound byte stream.
    pub async fn run<S>(&self, input_format: &str, body: S) -> Result<PipelineOutput>
    where
        S: Stream<Item = Result<Bytes>> + Unpin,
    {
        tracing::debug!(stage = ?PipelineStage::Receiving, input_format, "upload stream opened");
        // receiving and encoding overlap: body chunks stream straight into
        // the first conversion
        tracing::debug!(stage = ?PipelineStage::EncodingLossless, "lossless encode start");
        let audio = self.encode_lossless(input_format, body).await.map_err(|e| {
            tracing::warn!(stage = ?PipelineStage::Failed, error = %e, "lossless encode failed");
            e
        })?;
        tracing::debug!(
            stage = ?PipelineStage::LosslessComplete,
            size_bytes = audio.size_bytes,
            path = %audio.path.display(),
            "lossless artifact stored"
        );

        tracing::debug!(stage = ?PipelineStage::ExtractingPeaks, "peak extraction start");
        // on failure here the finished lossless artifact is kept
        let peaks = self.extract_peaks(&audio).await.map_err(|e| {
            tracing::warn!(stage = ?PipelineStage::Failed, error = %e, "peak extraction failed");
            e
        })?;
        tracing::debug!(
            stage = ?PipelineStage::Complete,
            peak_bytes = peaks.size_bytes,
            "pipeline complete"
        );

        Ok(PipelineOutput { audio, peaks })
    }

    /// Pass 1: inbound stream → transcoder → lossless artifact file
    async fn encode_lossless<S>(&self, input_format: &str, body: S) -> Result<StoredArtifact>
    where
        S: Stream<Item = Result<Bytes>> + Unpin,
    {
        let mut spec = ConversionSpec::new(input_format, &self.audio.lossless_format);
        spec.sample_rate = self.audio.sample_rate;
        spec.channels = self.audio.channels;

        let mut conv = ConversionStream::spawn(self.transcoder, &spec)?;
        let (path, mut file) = match self.store.create(&self.audio.lossless_format).await {
            Ok(created) => created,
            Err(e) => {
                conv.abort().await;
                return Err(e);
            }
        };

        let outcome = async {
            let mut output = conv.take_output()?;
            let drain = async {
                let mut buf = vec![0u8; COPY_BUF_SIZE];
                loop {
                    let n = output
                        .read(&mut buf)
                        .await
                        .map_err(|e| IngestError::SubprocessIo(format!("output pipe: {e}")))?;
                    if n == 0 {
                        break;
                    }
                    file.write_all(&buf[..n])
                        .await
                        .map_err(|e| IngestError::StorageWrite(e.to_string()))?;
                }
                file.flush()
                    .await
                    .map_err(|e| IngestError::StorageWrite(e.to_string()))
            };
            tokio::try_join!(conv.feed_from(body), drain)?;
            Ok::<(), IngestError>(())
        }
        .await;

        match outcome {
            Ok(()) => {
                if let Err(e) = conv.finish().await {
                    drop(file);
                    self.store.discard(&path).await;
                    return Err(e);
                }
                match self.store.finalize(path.clone(), file).await {
                    Ok(artifact) => Ok(artifact),
                    Err(e) => {
                        self.store.discard(&path).await;
                        Err(e)
                    }
                }
            }
            Err(e) => {
                conv.abort().await;
                drop(file);
                self.store.discard(&path).await;
                Err(e)
            }
        }
    }

    /// Pass 2: lossless artifact → transcoder (mono u8 PCM) → peak bytes
    async fn extract_peaks(&self, lossless: &StoredArtifact) -> Result<StoredArtifact> {
        let mut spec = ConversionSpec::new(self.audio.lossless_format.clone(), "u8");
        spec.sample_rate = self.audio.sample_rate;
        spec.channels = 1;

        let mut conv = ConversionStream::spawn(self.transcoder, &spec)?;
        let source = match File::open(&lossless.path).await {
            Ok(f) => f,
            Err(e) => {
                conv.abort().await;
                return Err(IngestError::Io(e));
            }
        };
        let (path, mut file) = match self.store.create("peaks").await {
            Ok(created) => created,
            Err(e) => {
                conv.abort().await;
                return Err(e);
            }
        };

        let mut extractor = PeakExtractor::new(self.audio.sample_rate, self.audio.peaks_per_second);

        let outcome = async {
            let mut output = conv.take_output()?;
            let feed = conv.feed_from(
                ReaderStream::with_capacity(source, COPY_BUF_SIZE).map(|r| r.map_err(IngestError::from)),
            );
            let drain = async {
                let mut buf = vec![0u8; COPY_BUF_SIZE];
                loop {
                    let n = output
                        .read(&mut buf)
                        .await
                        .map_err(|e| IngestError::SubprocessIo(format!("output pipe: {e}")))?;
                    if n == 0 {
                        break;
                    }
                    let peaks = extractor.feed(&buf[..n]);
                    if !peaks.is_empty() {
                        file.write_all(&peaks)
                            .await
                            .map_err(|e| IngestError::StorageWrite(e.to_string()))?;
                    }
                }
                file.flush()
                    .await
                    .map_err(|e| IngestError::StorageWrite(e.to_string()))
            };
            tokio::try_join!(feed, drain)?;
            Ok::<(), IngestError>(())
        }
        .await;

        if extractor.pending_samples() > 0 {
            tracing::debug!(
                discarded_samples = extractor.pending_samples(),
                "dropping trailing partial frame"
            );
        }

        match outcome {
            Ok(()) => {
                if let Err(e) = conv.finish().await {
                    drop(file);
                    self.store.discard(&path).await;
                    return Err(e);
                }
                match self.store.finalize(path.clone(), file).await {
                    Ok(artifact) => Ok(artifact),
                    Err(e) => {
                        self.store.discard(&path).await;
                        Err(e)
                    }
                }
            }
            Err(e) => {
                conv.abort().await;
                drop(file);
                self.store.discard(&path).await;
                Err(e)
            }
        }
    }
}
