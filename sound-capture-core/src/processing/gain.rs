//! Peak normalization.

use super::level_meter::peak_level;

/// Peak level normalization aims for.
pub const TARGET_PEAK: f32 = 1.0;

/// Peaks this close to the target are left alone, which keeps normalization idempotent.
const PEAK_TOLERANCE: f32 = 1e-6;

/// Scale `samples` so the peak reaches `TARGET_PEAK`. Returns the gain applied.
///
/// Silent or non-finite input is left unchanged (gain 1.0).
pub fn normalize(samples: &mut [f32]) -> f32 {
    let peak = peak_level(samples);
    if peak <= 0.0 || !peak.is_finite() || (peak - TARGET_PEAK).abs() <= PEAK_TOLERANCE {
        return 1.0;
    }

    let gain = TARGET_PEAK / peak;
    for sample in samples.iter_mut() {
        *sample = (*sample * gain).clamp(-TARGET_PEAK, TARGET_PEAK);
    }
    gain
}
