use serde::{Deserialize, Serialize};

use crate::processing::level_meter;

/// Kind of capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSourceKind {
    /// A microphone or line input.
    Input,
    /// An output device captured through loopback.
    Loopback,
}

/// An audio device available for capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub kind: AudioSourceKind,
    pub is_default: bool,
    /// Channel count of the device's default configuration, when known.
    pub channels: Option<u16>,
}

/// Sample encoding of a WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavSampleFormat {
    Int16,
    Int24,
    Float32,
}

impl WavSampleFormat {
    pub fn bits_per_sample(self) -> u16 {
        match self {
            Self::Int16 => 16,
            Self::Int24 => 24,
            Self::Float32 => 32,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        self.bits_per_sample() as usize / 8
    }
}

/// A contiguous run of interleaved frames read from a device in one call.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBlock {
    samples: Vec<f32>,
    channels: u16,
}

impl FrameBlock {
    /// Wrap interleaved samples. A trailing partial frame is dropped.
    pub fn new(mut samples: Vec<f32>, channels: u16) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Self { samples, channels }
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Peak magnitude of every channel in this block.
    pub fn peak_levels(&self) -> LevelSnapshot {
        level_meter::peak_per_channel(&self.samples, self.channels)
    }
}

/// Largest channel count the level meter tracks.
pub const MAX_METERED_CHANNELS: usize = 8;

/// Most recent per-channel peak magnitude.
///
/// A small `Copy` value so publishing it is a plain swap; channels beyond
/// `MAX_METERED_CHANNELS` are not metered.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelSnapshot {
    peaks: [f32; MAX_METERED_CHANNELS],
    channels: usize,
}

impl LevelSnapshot {
    pub fn from_peaks(peaks: &[f32]) -> Self {
        let channels = peaks.len().min(MAX_METERED_CHANNELS);
        let mut snapshot = Self {
            peaks: [0.0; MAX_METERED_CHANNELS],
            channels,
        };
        snapshot.peaks[..channels].copy_from_slice(&peaks[..channels]);
        snapshot
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn peaks(&self) -> &[f32] {
        &self.peaks[..self.channels]
    }

    /// Peak of `channel`, or 0.0 if that channel is not metered.
    pub fn peak(&self, channel: usize) -> f32 {
        self.peaks().get(channel).copied().unwrap_or(0.0)
    }

    /// Left/right bar values for a two-bar meter.
    ///
    /// Mono sources drive both bars from channel 0.
    pub fn display_levels(&self) -> (f32, f32) {
        let left = self.peak(0);
        let right = if self.channels > 1 { self.peak(1) } else { left };
        (
            level_meter::display_level(left),
            level_meter::display_level(right),
        )
    }
}

/// Counters for debugging a recorder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecorderDiagnostics {
    pub monitor_blocks: u64,
    pub capture_blocks_read: u64,
    pub capture_blocks_appended: u64,
    pub capture_blocks_discarded: u64,
    pub frames_appended: u64,
    pub checkpoints_written: u64,
    pub checkpoint_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frame_block_drops_partial_frame() {
        let block = FrameBlock::new(vec![0.1, 0.2, 0.3, 0.4, 0.5], 2);
        assert_eq!(block.frames(), 2);
        assert_eq!(block.samples(), &[0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn frame_block_peak_levels_per_channel() {
        let block = FrameBlock::new(vec![0.1, -0.9, -0.5, 0.2], 2);
        let levels = block.peak_levels();
        assert_eq!(levels.channels(), 2);
        assert_relative_eq!(levels.peak(0), 0.5);
        assert_relative_eq!(levels.peak(1), 0.9);
    }

    #[test]
    fn snapshot_ignores_channels_past_limit() {
        let peaks = vec![0.5; MAX_METERED_CHANNELS + 3];
        let snapshot = LevelSnapshot::from_peaks(&peaks);
        assert_eq!(snapshot.channels(), MAX_METERED_CHANNELS);
        assert_eq!(snapshot.peak(MAX_METERED_CHANNELS + 1), 0.0);
    }

    #[test]
    fn mono_display_mirrors_left_channel() {
        let snapshot = LevelSnapshot::from_peaks(&[0.25]);
        let (left, right) = snapshot.display_levels();
        assert_relative_eq!(left, right);
        assert!(left > 0.0);
    }

    #[test]
    fn sample_format_sizes() {
        assert_eq!(WavSampleFormat::Int16.bytes_per_sample(), 2);
        assert_eq!(WavSampleFormat::Int24.bytes_per_sample(), 3);
        assert_eq!(WavSampleFormat::Float32.bytes_per_sample(), 4);
    }
}
