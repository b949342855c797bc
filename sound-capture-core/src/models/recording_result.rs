use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Result returned when a session has been finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    /// Lossless WAV, always written.
    pub file_path: PathBuf,
    /// FLAC copy, when configured and successfully encoded.
    pub compressed_path: Option<PathBuf>,
    pub frames: usize,
    pub duration_secs: f64,
    /// SHA-256 of the lossless file.
    pub checksum: String,
    /// Set when the compressed encode failed; the WAV is still valid.
    pub compressed_error: Option<CaptureError>,
    /// Set when a device failure ended the session before the operator stopped it.
    pub stream_error: Option<CaptureError>,
    pub metadata: RecordingMetadata,
}

/// Metadata written as a JSON sidecar next to the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: usize,
    pub duration_secs: f64,
    pub file_path: String,
    pub compressed_path: Option<String>,
    pub checksum: String,
    pub normalized: bool,
    pub applied_gain: f32,
    pub trimmed_frames: usize,
    pub backup_dir: Option<String>,
    pub stream_error: Option<String>,
}

impl RecordingMetadata {
    pub fn new(sample_rate: u32, channels: u16, frames: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            sample_rate,
            channels,
            frames,
            duration_secs: frames as f64 / sample_rate.max(1) as f64,
            file_path: String::new(),
            compressed_path: None,
            checksum: String::new(),
            normalized: false,
            applied_gain: 1.0,
            trimmed_frames: 0,
            backup_dir: None,
            stream_error: None,
        }
    }
}
