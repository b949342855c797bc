use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::models::audio_models::{AudioSource, LevelSnapshot};
use crate::models::error::CaptureError;
use crate::session::shared::SessionShared;
use crate::session::signal::StopSignal;
use crate::traits::input_device::InputDevice;

/// Continuous level metering on its own device stream.
///
/// Runs whenever a device is selected, independent of recording. Each
/// iteration reads one default-sized block, publishes the per-channel
/// peaks and keeps nothing else. Slow UI readers just see an older snapshot.
pub(crate) struct LevelMonitor {
    source: AudioSource,
    signal: StopSignal,
    handle: Option<thread::JoinHandle<()>>,
}

impl LevelMonitor {
    /// Open `device` on a new thread and start metering.
    ///
    /// Returns once the stream is open, or with the error that prevented it.
    pub(crate) fn start(
        device: Arc<dyn InputDevice>,
        sample_rate: u32,
        shared: Arc<SessionShared>,
    ) -> Result<Self, CaptureError> {
        let source = device.info();
        let signal = StopSignal::new();
        let (opened_tx, opened_rx) = mpsc::channel();

        let worker_signal = signal.clone();
        let handle = thread::Builder::new()
            .name("level-monitor".into())
            .spawn(move || {
                let mut stream = match device.open(sample_rate) {
                    Ok(stream) => {
                        let _ = opened_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = opened_tx.send(Err(e));
                        return;
                    }
                };
                let block_frames = stream.default_block_frames().max(1);

                while !worker_signal.is_cancelled() {
                    match stream.read(block_frames, &worker_signal) {
                        Ok(Some(block)) => {
                            shared.publish_levels(block.peak_levels());
                            shared.update_diagnostics(|d| d.monitor_blocks += 1);
                        }
                        Ok(None) => break,
                        Err(e) => {
                            log::error!("Level monitor stopped: {}", e);
                            shared.report_error(&e);
                            break;
                        }
                    }
                }
                shared.publish_levels(LevelSnapshot::default());
            })
            .map_err(|e| CaptureError::StreamError(format!("failed to spawn monitor thread: {}", e)))?;

        let opened = opened_rx
            .recv()
            .unwrap_or_else(|_| Err(CaptureError::StreamError("monitor thread exited".into())));
        if let Err(e) = opened {
            let _ = handle.join();
            return Err(e);
        }

        log::info!("Monitoring levels on '{}'", source.name);
        Ok(Self {
            source,
            signal,
            handle: Some(handle),
        })
    }

    pub(crate) fn source(&self) -> &AudioSource {
        &self.source
    }

    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Stop metering and wait for the thread to release the device.
    pub(crate) fn stop(&mut self) {
        self.signal.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            log::debug!("Level monitor on '{}' stopped", self.source.name);
        }
    }
}

impl Drop for LevelMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
