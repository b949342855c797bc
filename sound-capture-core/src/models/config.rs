use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::audio_models::WavSampleFormat;
use super::error::CaptureError;

/// Post-processing and encoding switches applied when a recording is finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfiguration {
    /// Also write a compressed (FLAC) copy next to the lossless WAV.
    pub encode_as_compressed: bool,

    /// Rescale so the peak sample reaches full scale.
    pub normalize: bool,

    /// Drop quiet frames at the very start and end of the take.
    pub trim_silence: bool,

    /// Frames whose loudest channel stays below this amplitude count as silence.
    pub silence_threshold: f32,

    /// Sample format of the lossless WAV.
    pub lossless_format: WavSampleFormat,
}

impl Default for OutputConfiguration {
    fn default() -> Self {
        Self {
            encode_as_compressed: true,
            normalize: true,
            trim_silence: true,
            silence_threshold: 0.01,
            lossless_format: WavSampleFormat::Int16,
        }
    }
}

/// Configuration for a recorder.
///
/// Read once when the recorder is built; the settings layer that produces it
/// lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Requested sample rate in Hz (default: 48000).
    pub sample_rate: u32,

    /// Seconds between backup checkpoints while a session is active (default: 60).
    pub backup_interval_secs: f64,

    /// Root under which each session gets its own timestamped directory.
    pub backup_root: PathBuf,

    /// Where finalized files go. `None` writes them into the session directory.
    pub output_directory: Option<PathBuf>,

    /// Device to select at startup, or `None` for the host default.
    pub device_id: Option<String>,

    pub output: OutputConfiguration,
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.sample_rate == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "sample rate must be positive".into(),
            ));
        }
        let interval = self.backup_interval_secs;
        if interval <= 0.0 || Duration::try_from_secs_f64(interval).is_err() {
            return Err(CaptureError::ConfigurationFailed(format!(
                "invalid backup interval: {}",
                self.backup_interval_secs
            )));
        }
        let threshold = self.output.silence_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(CaptureError::ConfigurationFailed(format!(
                "invalid silence threshold: {}",
                threshold
            )));
        }
        Ok(())
    }

    /// Checkpoint interval. Out-of-range values saturate; `validate` rejects them.
    pub fn backup_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.backup_interval_secs).unwrap_or(Duration::MAX)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            backup_interval_secs: 60.0,
            backup_root: PathBuf::from("./recordings"),
            output_directory: None,
            device_id: None,
            output: OutputConfiguration::default(),
        }
    }
}
