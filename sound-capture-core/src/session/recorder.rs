use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::audio_models::{AudioSource, LevelSnapshot, RecorderDiagnostics};
use crate::models::config::RecorderConfig;
use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{format_elapsed, RecordingState, Telemetry};
use crate::processing::sample_buffer::SampleBuffer;
use crate::session::backup::BackupCheckpointer;
use crate::session::capture::CaptureEngine;
use crate::session::finalize::{self, FinalizeRequest};
use crate::session::monitor::LevelMonitor;
use crate::session::shared::SessionShared;
use crate::session::telemetry::TelemetryFeed;
use crate::storage::checkpoint;
use crate::traits::input_device::{DeviceHost, InputDevice};
use crate::traits::recorder_delegate::RecorderDelegate;

/// Workers and paths of the session between `start_recording` and finalize.
struct ActiveSession {
    engine: CaptureEngine,
    checkpointer: BackupCheckpointer,
    session_dir: PathBuf,
    session_ts: String,
    /// Samples sealed by a stop whose finalize failed, kept for the next attempt.
    sealed: Option<Vec<f32>>,
    stream_error: Option<CaptureError>,
    rescued: bool,
}

impl ActiveSession {
    fn stop_workers(&mut self) {
        self.checkpointer.stop();
        self.engine.stop();
    }
}

/// Gated recorder over one selected input device.
///
/// Owns the level monitor, the capture engine, the backup checkpointer and
/// the telemetry feed, and is the only place state transitions are made on
/// the operator's behalf.
///
/// ```text
/// [Device] ─→ [LevelMonitor] → LevelSnapshot
///     └────→ [CaptureEngine] → SampleBuffer ─→ [BackupCheckpointer] → backup_*.wav
///                                   └─ stop ─→ finalize → recording_*.wav / .flac
/// ```
///
/// Commands that do not apply in the current state are ignored and report
/// `false` (or `None`), matching a UI where one button serves two actions.
pub struct Recorder<H: DeviceHost> {
    host: H,
    config: RecorderConfig,
    shared: Arc<SessionShared>,
    device: Option<Arc<dyn InputDevice>>,
    monitor: Option<LevelMonitor>,
    session: Option<ActiveSession>,
    telemetry: Option<TelemetryFeed>,
}

impl<H: DeviceHost> Recorder<H> {
    /// Build a recorder. Selects `config.device_id` right away when it is set.
    pub fn new(host: H, config: RecorderConfig) -> Result<Self, CaptureError> {
        config.validate()?;

        let mut recorder = Self {
            host,
            config,
            shared: Arc::new(SessionShared::new()),
            device: None,
            monitor: None,
            session: None,
            telemetry: None,
        };
        if let Some(id) = recorder.config.device_id.clone() {
            recorder.select_device(&id)?;
        }
        Ok(recorder)
    }

    /// Register the delegate and start pushing telemetry to it.
    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) -> Result<(), CaptureError> {
        self.shared.set_delegate(Some(delegate));
        if self.telemetry.is_none() {
            self.telemetry = Some(TelemetryFeed::start(Arc::clone(&self.shared))?);
        }
        Ok(())
    }

    pub fn clear_delegate(&mut self) {
        if let Some(mut feed) = self.telemetry.take() {
            feed.stop();
        }
        self.shared.set_delegate(None);
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn available_devices(&self) -> Result<Vec<AudioSource>, CaptureError> {
        self.host.available_devices()
    }

    /// Switch to device `id` and start monitoring it.
    ///
    /// Ignored while a session exists. On failure no device is selected.
    pub fn select_device(&mut self, id: &str) -> Result<bool, CaptureError> {
        if self.session.is_some() {
            log::debug!("Ignoring device switch to '{}' during a session", id);
            return Ok(false);
        }
        let device = self.host.device(id)?;
        self.use_device(device)?;
        Ok(true)
    }

    /// Switch to the host's default device and start monitoring it.
    pub fn select_default_device(&mut self) -> Result<bool, CaptureError> {
        if self.session.is_some() {
            log::debug!("Ignoring default device selection during a session");
            return Ok(false);
        }
        let device = self.host.default_device()?;
        self.use_device(device)?;
        Ok(true)
    }

    fn use_device(&mut self, device: Arc<dyn InputDevice>) -> Result<(), CaptureError> {
        self.stop_monitoring();
        self.device = None;

        let monitor = LevelMonitor::start(Arc::clone(&device), self.config.sample_rate, Arc::clone(&self.shared))
            .inspect_err(|e| {
                log::error!("Cannot monitor '{}': {}", device.info().name, e);
                self.shared.report_error(e);
            })?;
        log::info!("Selected device '{}'", monitor.source().name);
        self.device = Some(device);
        self.monitor = Some(monitor);
        Ok(())
    }

    /// Stop level metering. The device stays selected.
    pub fn stop_monitoring(&mut self) -> bool {
        match self.monitor.take() {
            Some(mut monitor) => {
                monitor.stop();
                true
            }
            None => false,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.as_ref().map(|m| m.is_running()).unwrap_or(false)
    }

    /// The selected device, if any.
    pub fn selected_device(&self) -> Option<AudioSource> {
        match (&self.monitor, &self.device) {
            (Some(monitor), _) => Some(monitor.source().clone()),
            (None, Some(device)) => Some(device.info()),
            (None, None) => None,
        }
    }

    /// Begin a new session on the selected (or default) device.
    ///
    /// Returns `Ok(false)` when a session already exists.
    pub fn start_recording(&mut self) -> Result<bool, CaptureError> {
        if self.session.is_some() || !self.shared.state().is_idle() {
            log::debug!("start_recording ignored in state {:?}", self.shared.state());
            return Ok(false);
        }

        let device = match self.device.clone() {
            Some(device) => device,
            None => {
                let device = self.host.default_device()?;
                self.use_device(Arc::clone(&device))?;
                device
            }
        };

        let (session_dir, session_ts) = match checkpoint::create_session_dir(&self.config.backup_root) {
            Ok(created) => created,
            Err(e) => {
                let ts = checkpoint::timestamp();
                log::warn!("Backups unavailable for this session: {}", e);
                self.shared
                    .report_error(&CaptureError::CheckpointWriteError(e.to_string()));
                (self.config.backup_root.join(&ts), ts)
            }
        };

        self.shared.update_diagnostics(|d| {
            *d = RecorderDiagnostics {
                monitor_blocks: d.monitor_blocks,
                ..Default::default()
            }
        });

        // Recording is only published once the stream is open; until then capture drops blocks.
        let engine = match CaptureEngine::start(device, self.config.sample_rate, Arc::clone(&self.shared)) {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("Cannot start recording: {}", e);
                self.shared.report_error(&e);
                return Err(e);
            }
        };
        self.shared.set_buffer(Some(Arc::clone(engine.buffer())));
        if !self.shared.transition(RecordingState::Idle, RecordingState::Recording) {
            log::warn!("Capture stream failed while starting; session is {:?}", self.shared.state());
        }

        let checkpointer = match BackupCheckpointer::start(
            Arc::clone(engine.buffer()),
            session_dir.clone(),
            self.config.backup_interval(),
            Arc::clone(&self.shared),
        ) {
            Ok(checkpointer) => checkpointer,
            Err(e) => {
                drop(engine);
                self.shared.set_buffer(None);
                self.shared.set_state(RecordingState::Idle);
                return Err(e);
            }
        };

        log::info!("Recording started, backups in {}", session_dir.display());
        self.session = Some(ActiveSession {
            engine,
            checkpointer,
            session_dir,
            session_ts,
            sealed: None,
            stream_error: None,
            rescued: false,
        });
        Ok(true)
    }

    pub fn pause_recording(&mut self) -> bool {
        let paused = self.shared.transition(RecordingState::Recording, RecordingState::Paused);
        if !paused {
            log::debug!("pause_recording ignored in state {:?}", self.shared.state());
        }
        paused
    }

    pub fn resume_recording(&mut self) -> bool {
        let resumed = self.shared.transition(RecordingState::Paused, RecordingState::Recording);
        if !resumed {
            log::debug!("resume_recording ignored in state {:?}", self.shared.state());
        }
        resumed
    }

    /// Pause when recording, resume when paused.
    pub fn toggle_pause(&mut self) -> bool {
        match self.shared.state() {
            RecordingState::Recording => self.pause_recording(),
            RecordingState::Paused => self.resume_recording(),
            state => {
                log::debug!("toggle_pause ignored in state {:?}", state);
                false
            }
        }
    }

    /// End the session and finalize what was captured.
    ///
    /// Also finalizes a session a stream failure already stopped; the failure
    /// comes back in `RecordingResult::stream_error`. Returns `Ok(None)` when
    /// there is no session.
    ///
    /// If finalize fails the take is kept and the session stays `Stopped`:
    /// calling this again retries, `discard_recording` drops it.
    pub fn stop_recording(&mut self) -> Result<Option<RecordingResult>, CaptureError> {
        let Some(mut session) = self.session.take() else {
            log::debug!("stop_recording ignored in state {:?}", self.shared.state());
            return Ok(None);
        };

        self.shared.set_state(RecordingState::Stopped);
        session.stop_workers();

        let buffer = Arc::clone(session.engine.buffer());
        if session.sealed.is_none() {
            session.sealed = Some(buffer.seal());
            session.stream_error = self.shared.take_stream_error();
            log::info!(
                "Recording stopped at {} ({} frames)",
                format_elapsed(buffer.duration_secs()),
                buffer.frames()
            );
        } else {
            log::info!("Retrying finalize of {} frames", buffer.frames());
        }
        let samples = session.sealed.as_deref().unwrap_or_default();

        let output_dir = finalize::output_dir(self.config.output_directory.as_deref(), &session.session_dir);
        let stem = finalize::output_stem(&session.session_ts);
        let outcome = finalize::finalize(FinalizeRequest {
            samples,
            channels: buffer.channels(),
            sample_rate: buffer.sample_rate(),
            output: &self.config.output,
            output_dir: &output_dir,
            stem: &stem,
            backup_dir: Some(&session.session_dir),
            stream_error: session.stream_error.clone(),
        });

        match outcome {
            Ok(result) => {
                self.shared.set_buffer(None);
                self.shared.set_state(RecordingState::Idle);
                if let Some(e) = &result.compressed_error {
                    self.shared.report_error(e);
                }
                if let Some(delegate) = self.shared.delegate() {
                    delegate.on_recording_finished(&result);
                }
                Ok(Some(result))
            }
            Err(e) => {
                log::error!("Finalize failed, take kept for another attempt: {}", e);
                self.shared.report_error(&e);
                if !session.rescued {
                    session.rescued = rescue_checkpoint(&session.session_dir, samples, &buffer);
                }
                self.session = Some(session);
                Err(e)
            }
        }
    }

    /// Drop the session without writing output. Checkpoints stay on disk.
    pub fn discard_recording(&mut self) -> bool {
        let Some(mut session) = self.session.take() else {
            log::debug!("discard_recording ignored in state {:?}", self.shared.state());
            return false;
        };

        self.shared.set_state(RecordingState::Stopped);
        session.stop_workers();
        let discarded = match session.sealed.take() {
            Some(samples) => samples.len(),
            None => session.engine.buffer().seal().len(),
        };
        let _ = self.shared.take_stream_error();
        self.shared.set_buffer(None);
        self.shared.set_state(RecordingState::Idle);

        log::info!(
            "Discarded {} samples; backups kept in {}",
            discarded,
            session.session_dir.display()
        );
        true
    }

    /// Finalize any pending session and release every device and thread.
    pub fn shutdown(&mut self) -> Result<Option<RecordingResult>, CaptureError> {
        let result = self.stop_recording();
        self.stop_monitoring();
        self.clear_delegate();
        result
    }

    pub fn state(&self) -> RecordingState {
        self.shared.state()
    }

    pub fn levels(&self) -> LevelSnapshot {
        self.shared.levels()
    }

    /// Elapsed recorded time as `HH:MM:SS`.
    pub fn elapsed(&self) -> String {
        format_elapsed(self.shared.elapsed_secs())
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.shared.elapsed_secs()
    }

    pub fn telemetry(&self) -> Telemetry {
        self.shared.telemetry()
    }

    pub fn diagnostics(&self) -> RecorderDiagnostics {
        self.shared.diagnostics()
    }

    /// Backup directory of the current session.
    pub fn session_dir(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.session_dir.as_path())
    }
}

/// Write a sealed take whose finalize failed into the session directory.
fn rescue_checkpoint(session_dir: &Path, samples: &[f32], buffer: &SampleBuffer) -> bool {
    match checkpoint::write_checkpoint(session_dir, samples, buffer.channels(), buffer.sample_rate()) {
        Ok(path) => {
            log::warn!("Unfinalized take saved to {}", path.display());
            true
        }
        Err(e) => {
            log::error!("Could not save unfinalized take: {}", e);
            false
        }
    }
}

impl<H: DeviceHost> Drop for Recorder<H> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            log::warn!(
                "Recorder dropped with an unfinished session; backups remain in {}",
                session.session_dir.display()
            );
            session.stop_workers();
        }
        self.stop_monitoring();
        if let Some(mut feed) = self.telemetry.take() {
            feed.stop();
        }
    }
}
