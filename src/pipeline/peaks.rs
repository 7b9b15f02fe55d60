//! Peak amplitude extraction
//!
//! Reduces a stream of unsigned 8-bit mono PCM samples to one amplitude byte
//! per fixed-size frame, for waveform rendering. The frame buffer persists
//! across chunk boundaries, so a frame may span arbitrarily many input
//! chunks.

/// Stateful decimator: one `max - min` byte per `frame_width` input samples.
#[derive(Debug)]
pub struct PeakExtractor {
    frame_width: usize,
    current_frame: Vec<u8>,
}

impl PeakExtractor {
    /// Frame width is `floor(sample_rate / peaks_per_second)`, at least one
    /// sample. Defaults of 48000 Hz and 40 peaks/s give 1200 samples.
    pub fn new(sample_rate: u32, peaks_per_second: u32) -> Self {
        let frame_width = (sample_rate / peaks_per_second.max(1)).max(1) as usize;
        Self {
            frame_width,
            current_frame: Vec::with_capacity(frame_width),
        }
    }

    pub fn frame_width(&self) -> usize {
        self.frame_width
    }

    /// Samples buffered towards the next frame.
    ///
    /// When input ends these are dropped without emitting a partial-frame
    /// peak. That loses up to `frame_width - 1` trailing samples from the
    /// rendering; a known limitation kept for compatibility with existing
    /// peak artifacts.
    pub fn pending_samples(&self) -> usize {
        self.current_frame.len()
    }

    /// Consume a chunk of samples, returning the peak bytes of every frame
    /// completed by it.
    ///
    /// `max - min` over a frame of unsigned bytes always fits in a byte.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<u8> {
        let mut peaks = Vec::with_capacity(chunk.len() / self.frame_width + 1);
        let mut rest = chunk;
        while !rest.is_empty() {
            let take = (self.frame_width - self.current_frame.len()).min(rest.len());
            self.current_frame.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if self.current_frame.len() == self.frame_width {
                let mut lo = self.current_frame[0];
                let mut hi = self.current_frame[0];
                for &sample in &self.current_frame[1..] {
                    lo = lo.min(sample);
                    hi = hi.max(sample);
                }
                peaks.push(hi - lo);
                self.current_frame.clear();
            }
        }
        peaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor_with_width(frame_width: u32) -> PeakExtractor {
        // sample_rate / 1 peak per second = frame_width
        PeakExtractor::new(frame_width, 1)
    }

    #[test]
    fn test_frame_width_from_rates() {
        assert_eq!(PeakExtractor::new(48000, 40).frame_width(), 1200);
        assert_eq!(PeakExtractor::new(44100, 40).frame_width(), 1102);
        // floor division
        assert_eq!(PeakExtractor::new(44100, 41).frame_width(), 1075);
    }

    #[test]
    fn test_known_sequence() {
        let mut extractor = extractor_with_width(4);
        let peaks = extractor.feed(&[10, 200, 50, 60, 5, 5, 5, 5, 1, 2]);
        assert_eq!(peaks, vec![190, 0]);
        // trailing [1, 2] stays buffered, to be discarded at end of input
        assert_eq!(extractor.pending_samples(), 2);
    }

    #[test]
    fn test_single_byte_chunks_match_whole_chunk() {
        let input = [10u8, 200, 50, 60, 5, 5, 5, 5, 1, 2];
        let mut extractor = extractor_with_width(4);
        let mut peaks = Vec::new();
        for &byte in &input {
            peaks.extend(extractor.feed(&[byte]));
        }
        assert_eq!(peaks, vec![190, 0]);
    }

    #[test]
    fn test_empty_input_produces_empty_output() {
        let mut extractor = extractor_with_width(4);
        assert!(extractor.feed(&[]).is_empty());
        assert_eq!(extractor.pending_samples(), 0);
    }

    #[test]
    fn test_frame_spanning_chunk_boundary() {
        let mut extractor = extractor_with_width(4);
        assert!(extractor.feed(&[0, 255]).is_empty());
        assert_eq!(extractor.feed(&[128, 128, 9]), vec![255]);
        assert_eq!(extractor.pending_samples(), 1);
    }

    #[test]
    fn test_chunk_covering_many_frames() {
        let mut extractor = extractor_with_width(2);
        let peaks = extractor.feed(&[0, 10, 20, 20, 255, 0, 7]);
        assert_eq!(peaks, vec![10, 0, 255]);
        assert_eq!(extractor.pending_samples(), 1);
    }

    #[test]
    fn test_constant_signal_has_zero_amplitude() {
        let mut extractor = extractor_with_width(8);
        let peaks = extractor.feed(&[42u8; 32]);
        assert_eq!(peaks, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_extreme_amplitude_fits_in_byte() {
        let mut extractor = extractor_with_width(2);
        assert_eq!(extractor.feed(&[0, 255]), vec![255]);
    }
}
