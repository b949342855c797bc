//! Peak metering for the live input display.

use crate::models::audio_models::{LevelSnapshot, MAX_METERED_CHANNELS};

/// Peak absolute level of a run of samples.
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |max, &s| max.max(s.abs()))
}

/// Peak absolute level of each channel of interleaved samples.
pub fn peak_per_channel(samples: &[f32], channels: u16) -> LevelSnapshot {
    let channels = channels.max(1) as usize;
    let metered = channels.min(MAX_METERED_CHANNELS);
    let mut peaks = [0.0f32; MAX_METERED_CHANNELS];
    for frame in samples.chunks_exact(channels) {
        for (peak, &sample) in peaks.iter_mut().zip(&frame[..metered]) {
            *peak = peak.max(sample.abs());
        }
    }
    LevelSnapshot::from_peaks(&peaks[..metered])
}

/// Map a peak to a bar position.
///
/// Applies `log2(|v| + 1)` twice so quiet input still moves the bar;
/// full scale maps to 1.0.
pub fn display_level(peak: f32) -> f32 {
    let boost = |v: f32| (v.abs() + 1.0).log2();
    boost(boost(peak))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn peak_of_empty_is_zero() {
        assert_eq!(peak_level(&[]), 0.0);
        assert_eq!(peak_per_channel(&[], 2).peaks(), &[0.0, 0.0]);
    }

    #[test]
    fn peak_uses_magnitude() {
        assert_relative_eq!(peak_level(&[0.1, -0.7, 0.3]), 0.7);
    }

    #[test]
    fn peaks_are_split_by_channel() {
        let samples = [0.1, 0.0, -0.4, 0.2, 0.3, -0.8];
        let levels = peak_per_channel(&samples, 2);
        assert_relative_eq!(levels.peak(0), 0.4);
        assert_relative_eq!(levels.peak(1), 0.8);
    }

    #[test]
    fn display_level_endpoints() {
        assert_relative_eq!(display_level(0.0), 0.0);
        assert_relative_eq!(display_level(1.0), 1.0);
        let quiet = display_level(0.05);
        assert!(quiet > 0.05, "boost should lift quiet input, got {}", quiet);
    }
}
