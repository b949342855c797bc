use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::models::error::CaptureError;
use crate::models::state::RecordingState;
use crate::processing::sample_buffer::SampleBuffer;
use crate::session::shared::SessionShared;
use crate::session::signal::StopSignal;
use crate::traits::input_device::{InputDevice, InputStream};

/// Seconds of audio pulled from the device per capture read.
pub const CAPTURE_BLOCK_SECS: u32 = 1;

/// Gated capture into the session's `SampleBuffer`.
///
/// The engine keeps its stream open for the whole session. While the state
/// is `Recording` each one-second block is appended; while `Paused` blocks are
/// still read (so the device never backs up) but dropped. A stream failure
/// marks the session `Stopped` and leaves the partial buffer for finalize.
pub(crate) struct CaptureEngine {
    buffer: Arc<SampleBuffer>,
    signal: StopSignal,
    handle: Option<thread::JoinHandle<()>>,
}

impl CaptureEngine {
    /// Open `device` on a new thread and start the capture loop.
    ///
    /// Returns once the stream is open. The buffer is sized from the stream's
    /// actual channel count and rate.
    pub(crate) fn start(
        device: Arc<dyn InputDevice>,
        sample_rate: u32,
        shared: Arc<SessionShared>,
    ) -> Result<Self, CaptureError> {
        let signal = StopSignal::new();
        let (opened_tx, opened_rx) = mpsc::channel();

        let worker_signal = signal.clone();
        let handle = thread::Builder::new()
            .name("capture-engine".into())
            .spawn(move || {
                let stream = match device.open(sample_rate) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = opened_tx.send(Err(e));
                        return;
                    }
                };
                let buffer = Arc::new(SampleBuffer::new(stream.channels(), stream.sample_rate()));
                if opened_tx.send(Ok(Arc::clone(&buffer))).is_err() {
                    return;
                }
                capture_loop(stream, &buffer, &shared, &worker_signal);
            })
            .map_err(|e| CaptureError::StreamError(format!("failed to spawn capture thread: {}", e)))?;

        let opened = opened_rx
            .recv()
            .unwrap_or_else(|_| Err(CaptureError::StreamError("capture thread exited".into())));
        match opened {
            Ok(buffer) => Ok(Self {
                buffer,
                signal,
                handle: Some(handle),
            }),
            Err(e) => {
                let _ = handle.join();
                Err(e)
            }
        }
    }

    pub(crate) fn buffer(&self) -> &Arc<SampleBuffer> {
        &self.buffer
    }

    /// Stop reading and wait for the thread to release the device.
    pub(crate) fn stop(&mut self) {
        self.signal.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop(
    mut stream: Box<dyn InputStream>,
    buffer: &SampleBuffer,
    shared: &SessionShared,
    signal: &StopSignal,
) {
    let block_frames = (buffer.sample_rate() * CAPTURE_BLOCK_SECS) as usize;
    log::info!(
        "Capture started: {} Hz, {} channel(s), {} frames per block",
        buffer.sample_rate(),
        buffer.channels(),
        block_frames
    );

    while !signal.is_cancelled() {
        let block = match stream.read(block_frames, signal) {
            Ok(Some(block)) => block,
            Ok(None) => break,
            Err(e) => {
                log::error!("Capture stream failed after {} frames: {}", buffer.frames(), e);
                shared.fail_session(e);
                break;
            }
        };
        shared.update_diagnostics(|d| d.capture_blocks_read += 1);

        match shared.state() {
            RecordingState::Recording => match buffer.append(&block) {
                Ok(true) => {
                    let frames = block.frames() as u64;
                    shared.update_diagnostics(|d| {
                        d.capture_blocks_appended += 1;
                        d.frames_appended += frames;
                    });
                }
                Ok(false) => break,
                Err(e) => {
                    shared.fail_session(e);
                    break;
                }
            },
            // Idle: the recorder has not published Recording yet
            RecordingState::Paused | RecordingState::Idle => {
                shared.update_diagnostics(|d| d.capture_blocks_discarded += 1);
            }
            RecordingState::Stopped => break,
        }
    }
    log::debug!("Capture loop exited with {} frames", buffer.frames());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{wait_until, MockDevice};
    use std::time::Duration;

    fn recording_shared() -> Arc<SessionShared> {
        let shared = Arc::new(SessionShared::new());
        shared.set_state(RecordingState::Recording);
        shared
    }

    #[test]
    fn appends_one_second_blocks_while_recording() {
        let shared = recording_shared();
        let (device, feed) = MockDevice::fed("mic", 2);
        let mut engine = CaptureEngine::start(device, 48000, Arc::clone(&shared)).unwrap();

        feed.block(0.2);
        feed.block(0.2);
        assert!(wait_until(Duration::from_secs(5), || engine.buffer().frames() == 96000));
        engine.stop();

        assert_eq!(engine.buffer().channels(), 2);
        assert_eq!(shared.diagnostics().capture_blocks_appended, 2);
    }

    #[test]
    fn paused_blocks_are_discarded() {
        let shared = recording_shared();
        let (device, feed) = MockDevice::fed("mic", 1);
        let mut engine = CaptureEngine::start(device, 16000, Arc::clone(&shared)).unwrap();

        shared.set_state(RecordingState::Paused);
        feed.block(0.4);
        assert!(wait_until(Duration::from_secs(5), || {
            shared.diagnostics().capture_blocks_discarded == 1
        }));
        assert_eq!(engine.buffer().frames(), 0);

        shared.set_state(RecordingState::Recording);
        feed.block(0.4);
        assert!(wait_until(Duration::from_secs(5), || engine.buffer().frames() == 16000));
        engine.stop();
    }

    #[test]
    fn blocks_before_recording_is_published_are_dropped() {
        let shared = Arc::new(SessionShared::new());
        let (device, feed) = MockDevice::fed("mic", 1);
        let mut engine = CaptureEngine::start(device, 8000, Arc::clone(&shared)).unwrap();

        feed.block(0.4);
        assert!(wait_until(Duration::from_secs(5), || {
            shared.diagnostics().capture_blocks_discarded == 1
        }));
        assert_eq!(engine.buffer().frames(), 0);

        shared.set_state(RecordingState::Recording);
        feed.block(0.4);
        assert!(wait_until(Duration::from_secs(5), || engine.buffer().frames() == 8000));
        engine.stop();
    }

    #[test]
    fn stream_failure_stops_session_and_keeps_frames() {
        let shared = recording_shared();
        let (device, feed) = MockDevice::fed("mic", 1);
        let engine = CaptureEngine::start(device, 8000, Arc::clone(&shared)).unwrap();

        feed.block(0.1);
        assert!(wait_until(Duration::from_secs(5), || engine.buffer().frames() == 8000));
        feed.fail("driver reset");

        assert!(wait_until(Duration::from_secs(5), || shared.state() == RecordingState::Stopped));
        assert!(matches!(shared.take_stream_error(), Some(CaptureError::StreamError(_))));
        assert_eq!(engine.buffer().frames(), 8000);
    }

    #[test]
    fn open_failure_is_returned() {
        let shared = recording_shared();
        let result = CaptureEngine::start(MockDevice::unplugged("mic"), 48000, shared);
        assert!(matches!(result, Err(CaptureError::DeviceUnavailable(_))));
    }

    #[test]
    fn stop_interrupts_a_pending_read() {
        let shared = recording_shared();
        let (device, _feed) = MockDevice::fed("mic", 1);
        let mut engine = CaptureEngine::start(device, 48000, shared).unwrap();
        engine.stop();
        assert_eq!(engine.buffer().frames(), 0);
    }
}
