//! # sound-capture-core
//!
//! Platform-agnostic core of a gated audio recorder.
//!
//! A selected input device is metered continuously. While a session runs, a
//! capture engine appends one-second blocks to a growable sample buffer
//! (only while recording, never while paused), a checkpointer snapshots the
//! buffer to disk on a fixed interval, and stopping trims, normalizes and
//! encodes the take to WAV and optionally FLAC.
//!
//! Platform backends implement the `DeviceHost` / `InputDevice` /
//! `InputStream` traits and plug into the generic `Recorder`.
//!
//! ## Architecture
//!
//! ```text
//! sound-capture-core (this crate)
//! ├── traits/       ← DeviceHost, InputDevice, InputStream, RecorderDelegate
//! ├── models/       ← CaptureError, RecordingState, RecorderConfig, FrameBlock, etc.
//! ├── processing/   ← SampleBuffer, level meter, silence trim, gain, PCM, WAV header
//! ├── session/      ← Recorder and its worker threads, finalize
//! └── storage/      ← WAV writer, checkpoints, FLAC, metadata
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{
    AudioSource, AudioSourceKind, FrameBlock, LevelSnapshot, RecorderDiagnostics, WavSampleFormat,
};
pub use models::config::{OutputConfiguration, RecorderConfig};
pub use models::error::CaptureError;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::{RecordButtonLabel, RecordingState, Telemetry, TimeLabel};
pub use processing::sample_buffer::SampleBuffer;
pub use session::recorder::Recorder;
pub use session::signal::StopSignal;
pub use traits::input_device::{DeviceHost, InputDevice, InputStream};
pub use traits::recorder_delegate::RecorderDelegate;
