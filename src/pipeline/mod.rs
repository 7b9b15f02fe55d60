//! Upload processing pipeline
//!
//! Composes the conversion stream, artifact storage and peak extraction into
//! the two-pass flow: lossless re-encode to disk, then raw-PCM decode through
//! the peak decimator to disk.

pub mod orchestrator;
pub mod peaks;

pub use orchestrator::{PipelineOutput, UploadPipeline};
pub use peaks::PeakExtractor;
