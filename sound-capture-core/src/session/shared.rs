use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::models::audio_models::{LevelSnapshot, RecorderDiagnostics};
use crate::models::error::CaptureError;
use crate::models::state::{RecordingState, Telemetry};
use crate::processing::sample_buffer::SampleBuffer;
use crate::traits::recorder_delegate::RecorderDelegate;

/// State shared between the recorder and its worker threads.
///
/// The recorder is the only writer of `state` apart from the capture engine
/// marking a failed session `Stopped`. Workers read it once per iteration.
pub(crate) struct SessionShared {
    state: RwLock<RecordingState>,
    levels: Mutex<LevelSnapshot>,
    buffer: RwLock<Option<Arc<SampleBuffer>>>,
    stream_error: Mutex<Option<CaptureError>>,
    diagnostics: Mutex<RecorderDiagnostics>,
    delegate: RwLock<Option<Arc<dyn RecorderDelegate>>>,
}

impl SessionShared {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(RecordingState::Idle),
            levels: Mutex::new(LevelSnapshot::default()),
            buffer: RwLock::new(None),
            stream_error: Mutex::new(None),
            diagnostics: Mutex::new(RecorderDiagnostics::default()),
            delegate: RwLock::new(None),
        }
    }

    pub(crate) fn state(&self) -> RecordingState {
        *self.state.read()
    }

    /// Change state and notify the delegate if it actually changed.
    pub(crate) fn set_state(&self, new_state: RecordingState) {
        let changed = {
            let mut state = self.state.write();
            let changed = *state != new_state;
            *state = new_state;
            changed
        };
        if changed {
            if let Some(delegate) = self.delegate() {
                delegate.on_state_changed(new_state);
            }
        }
    }

    /// Apply `new_state` only if the current state is `from`.
    pub(crate) fn transition(&self, from: RecordingState, new_state: RecordingState) -> bool {
        {
            let mut state = self.state.write();
            if *state != from {
                return false;
            }
            *state = new_state;
        }
        if let Some(delegate) = self.delegate() {
            delegate.on_state_changed(new_state);
        }
        true
    }

    pub(crate) fn levels(&self) -> LevelSnapshot {
        *self.levels.lock()
    }

    pub(crate) fn publish_levels(&self, levels: LevelSnapshot) {
        *self.levels.lock() = levels;
    }

    pub(crate) fn set_buffer(&self, buffer: Option<Arc<SampleBuffer>>) {
        *self.buffer.write() = buffer;
    }

    pub(crate) fn elapsed_secs(&self) -> f64 {
        self.buffer
            .read()
            .as_ref()
            .map(|buffer| buffer.duration_secs())
            .unwrap_or(0.0)
    }

    pub(crate) fn telemetry(&self) -> Telemetry {
        Telemetry::new(self.state(), self.levels(), self.elapsed_secs())
    }

    /// Record a fatal stream failure: the session stops and the error waits for finalize.
    pub(crate) fn fail_session(&self, error: CaptureError) {
        *self.stream_error.lock() = Some(error.clone());
        self.set_state(RecordingState::Stopped);
        self.report_error(&error);
    }

    pub(crate) fn take_stream_error(&self) -> Option<CaptureError> {
        self.stream_error.lock().take()
    }

    pub(crate) fn report_error(&self, error: &CaptureError) {
        if let Some(delegate) = self.delegate() {
            delegate.on_error(error);
        }
    }

    pub(crate) fn diagnostics(&self) -> RecorderDiagnostics {
        self.diagnostics.lock().clone()
    }

    pub(crate) fn update_diagnostics(&self, update: impl FnOnce(&mut RecorderDiagnostics)) {
        update(&mut self.diagnostics.lock());
    }

    pub(crate) fn delegate(&self) -> Option<Arc<dyn RecorderDelegate>> {
        self.delegate.read().clone()
    }

    pub(crate) fn set_delegate(&self, delegate: Option<Arc<dyn RecorderDelegate>>) {
        *self.delegate.write() = delegate;
    }
}
