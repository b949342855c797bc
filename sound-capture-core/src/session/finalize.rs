//! Turning a sealed buffer into the finished recording files.
//!
//! ```text
//! samples → [trim silence] → [normalize] → WAV (always) → FLAC (optional)
//!                                              └→ sha256 + metadata sidecar
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::config::OutputConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::processing::{gain, silence};
use crate::storage::{checkpoint, flac, metadata, wav_writer};

/// Everything finalize needs from a stopped session.
#[derive(Debug)]
pub struct FinalizeRequest<'a> {
    /// Sealed take. Left untouched so a failed finalize can be retried.
    pub samples: &'a [f32],
    pub channels: u16,
    pub sample_rate: u32,
    pub output: &'a OutputConfiguration,
    pub output_dir: &'a Path,
    /// File stem, e.g. `recording_20240101_120000`.
    pub stem: &'a str,
    pub backup_dir: Option<&'a Path>,
    pub stream_error: Option<CaptureError>,
}

/// Post-process and encode a finished session.
///
/// Works on a copy of the samples. The lossless WAV is written first and its
/// failure is the only one that fails the call. A FLAC failure lands in `compressed_error`; a sidecar
/// failure is only logged.
pub fn finalize(request: FinalizeRequest<'_>) -> Result<RecordingResult, CaptureError> {
    let FinalizeRequest {
        samples,
        channels,
        sample_rate,
        output,
        output_dir,
        stem,
        backup_dir,
        stream_error,
    } = request;

    let mut samples = samples.to_vec();
    let trimmed_frames = if output.trim_silence {
        silence::trim_silence(&mut samples, channels, output.silence_threshold)
    } else {
        0
    };
    let applied_gain = if output.normalize {
        gain::normalize(&mut samples)
    } else {
        1.0
    };
    let frames = samples.len() / channels.max(1) as usize;

    fs::create_dir_all(output_dir).map_err(|e| {
        CaptureError::EncodeError(format!("failed to create output directory {}: {}", output_dir.display(), e))
    })?;
    let wav_path = checkpoint::unique_path(output_dir, stem, Some("wav"));
    let checksum = wav_writer::write_wav_file(&wav_path, &samples, channels, sample_rate, output.lossless_format)
        .map_err(|e| match e {
            CaptureError::EncodeError(_) => e,
            other => CaptureError::EncodeError(other.to_string()),
        })?;

    let (compressed_path, compressed_error) = if output.encode_as_compressed {
        let flac_path = wav_path.with_extension("flac");
        let bits = flac::bits_for(output.lossless_format);
        match flac::write_flac_file(&flac_path, &samples, channels, sample_rate, bits) {
            Ok(()) => (Some(flac_path), None),
            Err(e) => {
                log::warn!("Compressed encode failed, keeping {}: {}", wav_path.display(), e);
                (None, Some(e))
            }
        }
    } else {
        (None, None)
    };

    let mut meta = RecordingMetadata::new(sample_rate, channels, frames);
    meta.file_path = wav_path.to_string_lossy().into_owned();
    meta.compressed_path = compressed_path.as_ref().map(|p| p.to_string_lossy().into_owned());
    meta.checksum = checksum.clone();
    meta.normalized = output.normalize;
    meta.applied_gain = applied_gain;
    meta.trimmed_frames = trimmed_frames;
    meta.backup_dir = backup_dir.map(|p| p.to_string_lossy().into_owned());
    meta.stream_error = stream_error.as_ref().map(|e| e.to_string());

    if let Err(e) = metadata::write_metadata(&meta, &wav_path) {
        log::warn!("Failed to write metadata sidecar: {}", e);
    }

    log::info!(
        "Finalized {} frames ({} trimmed, gain {:.3}) to {}",
        frames,
        trimmed_frames,
        applied_gain,
        wav_path.display()
    );

    Ok(RecordingResult {
        file_path: wav_path,
        compressed_path,
        frames,
        duration_secs: meta.duration_secs,
        checksum,
        compressed_error,
        stream_error,
        metadata: meta,
    })
}

/// Default output stem for a session started at `session_ts`.
pub fn output_stem(session_ts: &str) -> String {
    format!("recording_{}", session_ts)
}

/// Directory finished files go to: the configured one, or the session directory.
pub fn output_dir(configured: Option<&Path>, session_dir: &Path) -> PathBuf {
    configured.unwrap_or(session_dir).to_path_buf()
}
