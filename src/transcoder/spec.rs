//! Conversion parameters and argument vector construction

use std::time::Duration;

/// Parameters for one conversion pass.
///
/// Immutable once a [`ConversionStream`](super::ConversionStream) has been
/// spawned from it; the spec fully determines the subprocess argument vector.
#[derive(Debug, Clone)]
pub struct ConversionSpec {
    /// Demuxer tag for the inbound byte stream
    pub input_format: String,
    /// Muxer tag for the produced byte stream
    pub output_format: String,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Output channel count
    pub channels: u16,
    /// Skip input before this offset
    pub trim_start: Option<Duration>,
    /// Stop reading input at this offset
    pub trim_end: Option<Duration>,
    /// Force a specific audio codec instead of the muxer default
    pub codec: Option<String>,
    /// Caller-supplied arguments, inserted before the output section
    pub extra_args: Vec<String>,
}

impl ConversionSpec {
    /// New spec with the default 48 kHz stereo output parameters
    pub fn new(input_format: impl Into<String>, output_format: impl Into<String>) -> Self {
        Self {
            input_format: input_format.into(),
            output_format: output_format.into(),
            sample_rate: 48000,
            channels: 2,
            trim_start: None,
            trim_end: None,
            codec: None,
            extra_args: Vec::new(),
        }
    }

    /// Build the transcoder argument vector.
    ///
    /// Ordering is load-bearing: the input format tag and the stdin marker
    /// come first, trim and codec flags sit between the input and output
    /// sections, and the output section ends with the stdout marker. Some
    /// transcoders parse trim/seek flags positionally relative to the
    /// input/output markers, so this exact layout must be preserved.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::with_capacity(12 + self.extra_args.len());

        args.push("-f".into());
        args.push(self.input_format.clone());
        args.push("-i".into());
        args.push("-".into());

        if let Some(start) = self.trim_start {
            args.push("-ss".into());
            args.push(format!("{}ms", start.as_millis()));
        }

        if let Some(end) = self.trim_end {
            args.push("-to".into());
            args.push(format!("{}ms", end.as_millis()));
        }

        if let Some(codec) = &self.codec {
            args.push("-acodec".into());
            args.push(codec.clone());
        }

        args.extend(self.extra_args.iter().cloned());

        args.push("-ar".into());
        args.push(self.sample_rate.to_string());
        args.push("-ac".into());
        args.push(self.channels.to_string());
        args.push("-f".into());
        args.push(self.output_format.clone());
        args.push("pipe:1".into());

        args
    }
}
