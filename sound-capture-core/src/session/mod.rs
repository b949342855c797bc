mod backup;
mod capture;
pub mod finalize;
mod monitor;
pub mod recorder;
mod shared;
pub mod signal;
mod telemetry;

pub use capture::CAPTURE_BLOCK_SECS;
pub use telemetry::TELEMETRY_HZ;
