//! WAV file format utilities.
//!
//! Generates the standard 44-byte RIFF header for integer PCM and IEEE
//! float data, patches the size fields once a file is complete, and reads
//! headers back for tools that inspect finished files or checkpoints.

use crate::models::audio_models::WavSampleFormat;
use crate::models::error::CaptureError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;

/// Fields of a parsed WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format: WavSampleFormat,
    pub channels: u16,
    pub sample_rate: u32,
    pub data_size: u32,
}

impl WavHeader {
    /// Number of whole frames the data chunk holds.
    pub fn frames(&self) -> usize {
        let frame_bytes = self.channels as usize * self.format.bytes_per_sample();
        if frame_bytes == 0 {
            return 0;
        }
        self.data_size as usize / frame_bytes
    }
}

fn format_code(format: WavSampleFormat) -> u16 {
    match format {
        WavSampleFormat::Float32 => FORMAT_IEEE_FLOAT,
        WavSampleFormat::Int16 | WavSampleFormat::Int24 => FORMAT_PCM,
    }
}

/// Generate a 44-byte WAV RIFF header, little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (format chunk size)
/// [20-21]  1 (PCM) or 3 (IEEE float)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bits / 8
/// [32-33]  block_align = channels * bits / 8
/// [34-35]  bits per sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(
    sample_rate: u32,
    format: WavSampleFormat,
    channels: u16,
    data_size: u32,
) -> [u8; WAV_HEADER_SIZE] {
    let bit_depth = format.bits_per_sample();
    let block_align = channels * bit_depth / 8;
    let byte_rate = sample_rate * block_align as u32;
    let chunk_size = 36u32.saturating_add(data_size);

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&format_code(format).to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Data-chunk size as the u32 the header stores, or an error past the 4 GiB limit.
pub fn checked_data_size(data_size: u64) -> Result<u32, CaptureError> {
    u32::try_from(data_size)
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| {
            CaptureError::EncodeError(format!(
                "{} bytes of audio exceed the WAV size limit",
                data_size
            ))
        })
}

/// Parse a 44-byte header written by `generate_wav_header`.
pub fn read_header(bytes: &[u8]) -> Result<WavHeader, CaptureError> {
    let invalid = |why: &str| CaptureError::StorageError(format!("invalid WAV header: {}", why));

    if bytes.len() < WAV_HEADER_SIZE {
        return Err(invalid("too short"));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(invalid("missing RIFF/WAVE magic"));
    }
    if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
        return Err(invalid("unexpected chunk layout"));
    }

    let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
    let u32_at = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

    let format = match (u16_at(20), u16_at(34)) {
        (FORMAT_PCM, 16) => WavSampleFormat::Int16,
        (FORMAT_PCM, 24) => WavSampleFormat::Int24,
        (FORMAT_IEEE_FLOAT, 32) => WavSampleFormat::Float32,
        (code, bits) => return Err(invalid(&format!("unsupported format {} / {} bits", code, bits))),
    };

    Ok(WavHeader {
        format,
        channels: u16_at(22),
        sample_rate: u32_at(24),
        data_size: u32_at(40),
    })
}
