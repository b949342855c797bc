use std::sync::Arc;

use crate::models::audio_models::{AudioSource, FrameBlock};
use crate::models::error::CaptureError;
use crate::session::signal::StopSignal;

/// An open, running input stream.
///
/// Streams are opened on the thread that reads them and never leave it,
/// so implementations need not be `Send`.
pub trait InputStream {
    /// Channels per frame of every block this stream yields.
    fn channels(&self) -> u16;

    /// Actual sample rate of the stream, which may differ from the rate requested.
    fn sample_rate(&self) -> u32;

    /// Block size the device naturally delivers, used for level metering.
    fn default_block_frames(&self) -> usize;

    /// Block until `num_frames` frames are available and return them.
    ///
    /// Returns `Ok(None)` if `cancel` fires first. Driver failures surface as
    /// `CaptureError::StreamError` and end the stream.
    fn read(&mut self, num_frames: usize, cancel: &StopSignal) -> Result<Option<FrameBlock>, CaptureError>;
}

/// A resolved capture device.
pub trait InputDevice: Send + Sync {
    fn info(&self) -> AudioSource;

    /// Open a new stream at (or near) `sample_rate`.
    ///
    /// Fails with `CaptureError::DeviceUnavailable` when the device no longer
    /// resolves to live hardware.
    fn open(&self, sample_rate: u32) -> Result<Box<dyn InputStream>, CaptureError>;
}

/// Source of capture devices for a platform audio API.
pub trait DeviceHost: Send + Sync {
    /// List every device that can be recorded from.
    fn available_devices(&self) -> Result<Vec<AudioSource>, CaptureError>;

    /// Resolve the host's default capture device.
    fn default_device(&self) -> Result<Arc<dyn InputDevice>, CaptureError>;

    /// Resolve a device by the `id` reported in `available_devices`.
    fn device(&self, id: &str) -> Result<Arc<dyn InputDevice>, CaptureError>;
}
