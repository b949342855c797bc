use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::models::error::CaptureError;
use crate::processing::sample_buffer::SampleBuffer;
use crate::session::shared::SessionShared;
use crate::session::signal::StopSignal;
use crate::storage::checkpoint;

/// Periodic snapshots of the live buffer into the session directory.
///
/// Ticks every `interval` for as long as the session is Recording or Paused.
/// A tick with nothing new since the last checkpoint writes nothing; a failed
/// write is reported and the next tick tries again with a fresh snapshot.
pub(crate) struct BackupCheckpointer {
    signal: StopSignal,
    handle: Option<thread::JoinHandle<()>>,
}

impl BackupCheckpointer {
    pub(crate) fn start(
        buffer: Arc<SampleBuffer>,
        session_dir: PathBuf,
        interval: Duration,
        shared: Arc<SessionShared>,
    ) -> Result<Self, CaptureError> {
        let signal = StopSignal::new();
        let worker_signal = signal.clone();

        let handle = thread::Builder::new()
            .name("backup-checkpointer".into())
            .spawn(move || {
                let mut last_frames = 0;
                while !worker_signal.wait_timeout(interval) {
                    if !shared.state().is_active() {
                        break;
                    }
                    if let Some(frames) = checkpoint_once(&buffer, &session_dir, last_frames, &shared) {
                        last_frames = frames;
                    }
                }
            })
            .map_err(|e| CaptureError::StorageError(format!("failed to spawn checkpoint thread: {}", e)))?;

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    pub(crate) fn stop(&mut self) {
        self.signal.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BackupCheckpointer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Write one checkpoint if the buffer grew. Returns the frames written on success.
fn checkpoint_once(
    buffer: &SampleBuffer,
    session_dir: &Path,
    last_frames: usize,
    shared: &SessionShared,
) -> Option<usize> {
    let frames = buffer.frames();
    if frames == 0 || frames == last_frames {
        log::debug!("Skipping checkpoint: {} frames, unchanged", frames);
        return None;
    }

    let samples = buffer.snapshot();
    let frames = samples.len() / buffer.channels().max(1) as usize;
    match checkpoint::write_checkpoint(session_dir, &samples, buffer.channels(), buffer.sample_rate()) {
        Ok(path) => {
            log::debug!("Checkpoint of {} frames written to {}", frames, path.display());
            shared.update_diagnostics(|d| d.checkpoints_written += 1);
            if let Some(delegate) = shared.delegate() {
                delegate.on_checkpoint_written(&path);
            }
            Some(frames)
        }
        Err(e) => {
            log::warn!("Checkpoint failed, recording continues: {}", e);
            shared.update_diagnostics(|d| d.checkpoint_failures += 1);
            shared.report_error(&e);
            None
        }
    }
}
