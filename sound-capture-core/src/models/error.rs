use thiserror::Error;

/// Errors that can occur while monitoring, recording or exporting audio.
///
/// Only `DeviceUnavailable` and `StreamError` end an activity. Checkpoint
/// failures are reported but recording carries on; encode failures keep
/// whatever lossless artifact was already written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("device not available: {0}")]
    DeviceUnavailable(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("checkpoint write failed: {0}")]
    CheckpointWriteError(String),

    #[error("encoding failed: {0}")]
    EncodeError(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl CaptureError {
    /// Whether this error ends the monitoring or recording activity that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DeviceUnavailable(_) | Self::StreamError(_))
    }
}
