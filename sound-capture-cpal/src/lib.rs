//! # sound-capture-cpal
//!
//! cpal backend for sound-capture.
//!
//! Provides:
//! - `CpalHost`: device enumeration and lookup by id
//! - `CpalDevice`: a device resolved by name each time it is opened
//! - `CpalInputStream`: a running stream read in blocking, cancellable blocks
//!
//! ## Usage
//! ```ignore
//! use sound_capture_core::{Recorder, RecorderConfig};
//! use sound_capture_cpal::CpalHost;
//!
//! let mut recorder = Recorder::new(CpalHost::new(), RecorderConfig::default())?;
//! recorder.select_default_device()?;
//! recorder.start_recording()?;
//! ```

pub mod device;
pub mod host;
pub mod sample_queue;
pub mod stream;

pub use device::CpalDevice;
pub use host::CpalHost;
pub use sample_queue::SampleQueue;
pub use stream::CpalInputStream;
