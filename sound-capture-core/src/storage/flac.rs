//! FLAC encoding of finished recordings.

use std::fs;
use std::path::Path;

use flacenc::component::BitRepr;
use flacenc::error::Verify;

use crate::models::audio_models::WavSampleFormat;
use crate::models::error::CaptureError;
use crate::processing::pcm;

/// FLAC bit depth that preserves a lossless WAV in `format`.
pub fn bits_for(format: WavSampleFormat) -> u16 {
    match format {
        WavSampleFormat::Int16 => 16,
        WavSampleFormat::Int24 | WavSampleFormat::Float32 => 24,
    }
}

/// Encode interleaved float samples to FLAC bytes.
pub fn encode_to_flac(
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
) -> Result<Vec<u8>, CaptureError> {
    if channels == 0 || samples.len() < channels as usize {
        return Err(CaptureError::EncodeError("no audio to encode".into()));
    }

    let ints = pcm::to_int_samples(samples, bits_per_sample);
    let config = flacenc::config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| CaptureError::EncodeError(format!("invalid FLAC encoder config: {:?}", e)))?;
    let source = flacenc::source::MemSource::from_samples(
        &ints,
        channels as usize,
        bits_per_sample as usize,
        sample_rate as usize,
    );
    let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| CaptureError::EncodeError(format!("FLAC encode failed: {:?}", e)))?;

    let mut sink = flacenc::bitsink::ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|_| CaptureError::EncodeError("failed to serialize FLAC stream".into()))?;
    Ok(sink.as_slice().to_vec())
}

/// Encode and write a `.flac` file.
pub fn write_flac_file(
    path: &Path,
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
) -> Result<(), CaptureError> {
    let bytes = encode_to_flac(samples, channels, sample_rate, bits_per_sample)?;
    fs::write(path, bytes).map_err(|e| CaptureError::EncodeError(format!("failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(frames: usize, channels: u16) -> Vec<f32> {
        (0..frames * channels as usize)
            .map(|i| ((i / channels as usize) as f32 * 0.05).sin() * 0.5)
            .collect()
    }

    #[test]
    fn encodes_stream_with_flac_magic() {
        let bytes = encode_to_flac(&tone(4800, 2), 2, 48000, 16).unwrap();
        assert_eq!(&bytes[0..4], b"fLaC");
    }

    #[test]
    fn twenty_four_bit_output_is_supported() {
        let bytes = encode_to_flac(&tone(4096, 1), 1, 44100, 24).unwrap();
        assert_eq!(&bytes[0..4], b"fLaC");
    }

    #[test]
    fn empty_input_is_an_encode_error() {
        assert!(matches!(
            encode_to_flac(&[], 2, 48000, 16),
            Err(CaptureError::EncodeError(_))
        ));
    }

    #[test]
    fn float_and_24_bit_wavs_map_to_24_bit_flac() {
        assert_eq!(bits_for(WavSampleFormat::Int16), 16);
        assert_eq!(bits_for(WavSampleFormat::Int24), 24);
        assert_eq!(bits_for(WavSampleFormat::Float32), 24);
    }

    #[test]
    fn write_failure_is_an_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("take.flac");
        assert!(matches!(
            write_flac_file(&path, &tone(1024, 1), 1, 8000, 16),
            Err(CaptureError::EncodeError(_))
        ));
    }
}
