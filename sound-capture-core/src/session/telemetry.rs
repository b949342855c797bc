use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::models::error::CaptureError;
use crate::session::shared::SessionShared;
use crate::session::signal::StopSignal;

/// UI refresh rate of the telemetry feed.
pub const TELEMETRY_HZ: u32 = 30;

/// Pushes a `Telemetry` snapshot to the delegate at `TELEMETRY_HZ`.
pub(crate) struct TelemetryFeed {
    signal: StopSignal,
    handle: Option<thread::JoinHandle<()>>,
}

impl TelemetryFeed {
    pub(crate) fn start(shared: Arc<SessionShared>) -> Result<Self, CaptureError> {
        let signal = StopSignal::new();
        let worker_signal = signal.clone();
        let period = Duration::from_secs(1) / TELEMETRY_HZ;

        let handle = thread::Builder::new()
            .name("telemetry-feed".into())
            .spawn(move || {
                while !worker_signal.wait_timeout(period) {
                    if let Some(delegate) = shared.delegate() {
                        delegate.on_telemetry(&shared.telemetry());
                    }
                }
            })
            .map_err(|e| CaptureError::StreamError(format!("failed to spawn telemetry thread: {}", e)))?;

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

impl Drop for TelemetryFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state::{RecordingState, TimeLabel};
    use crate::test_support::{wait_until, RecordingDelegate};

    #[test]
    fn ticks_reach_the_delegate() {
        let shared = Arc::new(SessionShared::new());
        let delegate = Arc::new(RecordingDelegate::default());
        shared.set_delegate(Some(delegate.clone()));

        let mut feed = TelemetryFeed::start(Arc::clone(&shared)).unwrap();
        assert!(wait_until(Duration::from_secs(5), || delegate.telemetry.lock().len() >= 3));
        shared.set_state(RecordingState::Paused);
        assert!(wait_until(Duration::from_secs(5), || {
            delegate
                .telemetry
                .lock()
                .last()
                .map(|t| t.time_label == TimeLabel::Paused)
                .unwrap_or(false)
        }));
        feed.stop();

        let ticks = delegate.telemetry.lock().len();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(delegate.telemetry.lock().len(), ticks);
        assert_eq!(delegate.telemetry.lock()[0].elapsed, "00:00:00");
    }
}
