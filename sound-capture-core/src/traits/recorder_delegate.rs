use std::path::Path;

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{RecordingState, Telemetry};

/// Event delegate for recorder notifications.
///
/// Methods are called from worker threads, not the UI thread.
/// Implementations should marshal to the UI thread if needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: RecordingState);

    /// Called by the telemetry feed, about 30 times a second.
    fn on_telemetry(&self, _telemetry: &Telemetry) {}

    /// Called after a backup checkpoint has been written.
    fn on_checkpoint_written(&self, _path: &Path) {}

    /// Called when a worker hits an error, fatal or not.
    fn on_error(&self, error: &CaptureError);

    /// Called once a stopped session has been finalized.
    fn on_recording_finished(&self, result: &RecordingResult);
}
