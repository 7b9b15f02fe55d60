//! End-to-end pipeline tests
//!
//! Small shell scripts stand in for the transcoder binary so the full
//! two-pass pipeline can run without an ffmpeg install. A pass-through
//! script makes byte-level expectations exact.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use bytes::Bytes;
use futures_util::stream;

use crate::config::AudioConfig;
use crate::error::{IngestError, Result};
use crate::pipeline::{PeakExtractor, UploadPipeline};
use crate::storage::ArtifactStore;
use crate::transcoder::Transcoder;

/// Write an executable stub transcoder script into `dir`
fn stub_transcoder(dir: &Path, body: &str) -> Transcoder {
    let path = dir.join("stub-transcoder");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
    let mut perms = std::fs::metadata(&path).expect("stat stub").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod stub");
    Transcoder::resolve(path).expect("resolve stub")
}

/// The input bytes as a chunked upload stream
fn chunked(input: &[u8], chunk_size: usize) -> stream::Iter<std::vec::IntoIter<Result<Bytes>>> {
    let chunks: Vec<Result<Bytes>> = input
        .chunks(chunk_size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    stream::iter(chunks)
}

fn artifact_extensions(store_root: &Path) -> Vec<String> {
    let mut exts: Vec<String> = std::fs::read_dir(store_root)
        .expect("read store dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string()
        })
        .collect();
    exts.sort();
    exts
}

#[tokio::test]
async fn test_upload_produces_both_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let transcoder = stub_transcoder(dir.path(), "exec cat");
    let store = ArtifactStore::open(dir.path().join("artifacts")).expect("open store");
    let audio = AudioConfig::default();
    let pipeline = UploadPipeline::new(&transcoder, &store, &audio);

    // 2 full frames of 1200 samples plus 100 trailing samples
    let input: Vec<u8> = (0..2500u32)
        .map(|i| if i % 2 == 0 { 0 } else { 255 })
        .collect();

    let output = pipeline
        .run("wav", chunked(&input, 333))
        .await
        .expect("pipeline");

    assert_eq!(output.audio.size_bytes, input.len() as u64);
    assert_eq!(std::fs::read(&output.audio.path).expect("audio"), input);

    let mut reference = PeakExtractor::new(audio.sample_rate, audio.peaks_per_second);
    let expected_peaks = reference.feed(&input);
    assert_eq!(expected_peaks, vec![255, 255]);
    assert_eq!(std::fs::read(&output.peaks.path).expect("peaks"), expected_peaks);
    assert_eq!(output.peaks.size_bytes, 2);
}

#[tokio::test]
async fn test_failing_transcoder_leaves_no_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let transcoder = stub_transcoder(dir.path(), "exit 3");
    let store = ArtifactStore::open(dir.path().join("artifacts")).expect("open store");
    let audio = AudioConfig::default();
    let pipeline = UploadPipeline::new(&transcoder, &store, &audio);

    let input = vec![1u8; 4096];
    let err = pipeline
        .run("wav", chunked(&input, 512))
        .await
        .expect_err("pipeline must fail");

    assert!(matches!(err, IngestError::SubprocessIo(_)));
    assert!(artifact_extensions(store.root()).is_empty());
}

#[tokio::test]
async fn test_peak_failure_retains_lossless_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    // pass 1 converts to flac and passes through; the u8 decode of pass 2 dies
    let script = r#"for a in "$@"; do [ "$a" = "u8" ] && exit 3; done
exec cat"#;
    let transcoder = stub_transcoder(dir.path(), script);
    let store = ArtifactStore::open(dir.path().join("artifacts")).expect("open store");
    let audio = AudioConfig::default();
    let pipeline = UploadPipeline::new(&transcoder, &store, &audio);

    let input = vec![9u8; 2048];
    let err = pipeline
        .run("wav", chunked(&input, 256))
        .await
        .expect_err("peak pass must fail");

    assert!(matches!(err, IngestError::SubprocessIo(_)));
    // the completed lossless artifact stays, the partial peak artifact is gone
    assert_eq!(artifact_extensions(store.root()), vec!["flac".to_string()]);
}

#[tokio::test]
async fn test_early_closing_transcoder_still_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let transcoder = stub_transcoder(dir.path(), "exec head -c 4");
    let store = ArtifactStore::open(dir.path().join("artifacts")).expect("open store");
    let audio = AudioConfig::default();
    let pipeline = UploadPipeline::new(&transcoder, &store, &audio);

    let input = vec![5u8; 200_000];
    let output = pipeline
        .run("wav", chunked(&input, 4096))
        .await
        .expect("early close is not a failure");

    assert_eq!(output.audio.size_bytes, 4);
    // four samples never fill a peak frame, so the peak artifact is empty
    assert_eq!(output.peaks.size_bytes, 0);
}

#[tokio::test]
async fn test_empty_upload_produces_empty_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let transcoder = stub_transcoder(dir.path(), "exec cat");
    let store = ArtifactStore::open(dir.path().join("artifacts")).expect("open store");
    let audio = AudioConfig::default();
    let pipeline = UploadPipeline::new(&transcoder, &store, &audio);

    let output = pipeline
        .run("wav", chunked(&[], 512))
        .await
        .expect("pipeline");

    assert_eq!(output.audio.size_bytes, 0);
    assert_eq!(output.peaks.size_bytes, 0);
    assert!(output.audio.path.exists());
    assert!(output.peaks.path.exists());
}
