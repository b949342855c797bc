//! Leading/trailing silence trimming.
//!
//! Only the contiguous quiet runs at the very start and end are removed.
//! Gaps inside the take are kept so intentional pauses survive.

/// Loudest channel of one frame.
pub fn frame_magnitude(frame: &[f32]) -> f32 {
    frame.iter().fold(0.0f32, |max, &s| max.max(s.abs()))
}

/// Range of frames that survives trimming, as `(first, end)` frame indices.
///
/// A frame is silent when its magnitude is below `threshold`. An all-silent
/// input yields an empty range.
pub fn audible_range(samples: &[f32], channels: u16, threshold: f32) -> (usize, usize) {
    let channels = channels.max(1) as usize;
    let frames: Vec<&[f32]> = samples.chunks_exact(channels).collect();
    let is_audible = |frame: &&[f32]| frame_magnitude(frame) >= threshold;

    let Some(first) = frames.iter().position(is_audible) else {
        return (0, 0);
    };
    let last = frames.iter().rposition(is_audible).unwrap_or(first);
    (first, last + 1)
}

/// Trim silent frames from both ends in place. Returns the number of frames removed.
pub fn trim_silence(samples: &mut Vec<f32>, channels: u16, threshold: f32) -> usize {
    let width = channels.max(1) as usize;
    let total_frames = samples.len() / width;
    let (first, end) = audible_range(samples, channels, threshold);

    samples.truncate(end * width);
    samples.drain(..first * width);
    total_frames - (end - first)
}
