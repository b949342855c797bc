//! Float sample conversion to little-endian PCM bytes and integer samples.

use crate::models::audio_models::WavSampleFormat;

const INT24_MAX: f32 = 8_388_607.0;

/// Convert `[-1.0, 1.0]` floats to little-endian bytes in `format`.
///
/// Integer formats clamp out-of-range values.
pub fn encode_samples(samples: &[f32], format: WavSampleFormat) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * format.bytes_per_sample());
    match format {
        WavSampleFormat::Int16 => {
            for &sample in samples {
                data.extend_from_slice(&to_i16(sample).to_le_bytes());
            }
        }
        WavSampleFormat::Int24 => {
            for &sample in samples {
                let bytes = to_i24(sample).to_le_bytes();
                data.extend_from_slice(&bytes[..3]);
            }
        }
        WavSampleFormat::Float32 => {
            for &sample in samples {
                data.extend_from_slice(&sample.to_le_bytes());
            }
        }
    }
    data
}

/// Integer samples at `bits_per_sample` (16 or 24), as FLAC expects them.
pub fn to_int_samples(samples: &[f32], bits_per_sample: u16) -> Vec<i32> {
    if bits_per_sample >= 24 {
        samples.iter().map(|&s| to_i24(s)).collect()
    } else {
        samples.iter().map(|&s| to_i16(s) as i32).collect()
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn to_i24(sample: f32) -> i32 {
    (sample.clamp(-1.0, 1.0) * INT24_MAX) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int16_full_scale_and_clamp() {
        let bytes = encode_samples(&[1.0, -1.0, 2.0, 0.0], WavSampleFormat::Int16);
        let values: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(values, vec![i16::MAX, -i16::MAX, i16::MAX, 0]);
    }

    #[test]
    fn int24_is_three_bytes_per_sample() {
        let bytes = encode_samples(&[1.0, -1.0], WavSampleFormat::Int24);
        assert_eq!(bytes.len(), 6);
        assert_eq!(&bytes[0..3], &[0xFF, 0xFF, 0x7F]);
        assert_eq!(&bytes[3..6], &[0x01, 0x00, 0x80]);
    }

    #[test]
    fn float32_is_bit_exact() {
        let bytes = encode_samples(&[0.123, -1.5], WavSampleFormat::Float32);
        let first = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let second = f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(first, 0.123);
        assert_eq!(second, -1.5);
    }

    #[test]
    fn int_samples_for_flac() {
        assert_eq!(to_int_samples(&[1.0, -0.5], 16), vec![32767, -16383]);
        assert_eq!(to_int_samples(&[1.0], 24), vec![8_388_607]);
    }
}
