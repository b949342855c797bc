//! cpal input streams adapted to the blocking `InputStream` contract.

use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleRate, SupportedStreamConfig};

use sound_capture_core::{AudioSourceKind, CaptureError, FrameBlock, InputStream, StopSignal};

use crate::sample_queue::SampleQueue;

/// Seconds of audio the queue holds before dropping the oldest samples.
const QUEUE_SECONDS: usize = 4;

/// Frames per level-meter read.
const DEFAULT_BLOCK_FRAMES: usize = 1024;

/// A stream that delivers nothing for this long is considered dead.
const STALL_TIMEOUT: Duration = Duration::from_secs(3);

/// An open cpal stream plus the queue its callback fills.
///
/// Dropping it stops the device.
pub struct CpalInputStream {
    _stream: cpal::Stream,
    queue: Arc<SampleQueue>,
    channels: u16,
    sample_rate: u32,
}

impl CpalInputStream {
    /// Build and start a stream on `device`, as close to `sample_rate` as it supports.
    pub fn open(device: &cpal::Device, kind: AudioSourceKind, sample_rate: u32) -> Result<Self, CaptureError> {
        let config = stream_config(device, kind, sample_rate)?;
        let channels = config.channels();
        let actual_rate = config.sample_rate().0;
        if actual_rate != sample_rate {
            log::warn!("Device does not support {}Hz, capturing at {}Hz", sample_rate, actual_rate);
        }
        log::debug!(
            "Stream config: {} Hz, {:?}, {} channels",
            actual_rate,
            config.sample_format(),
            channels
        );

        let capacity = actual_rate as usize * channels as usize * QUEUE_SECONDS;
        let queue = Arc::new(SampleQueue::new(capacity));

        let err_queue = Arc::clone(&queue);
        let err_fn = move |err: cpal::StreamError| {
            log::error!("Audio stream error: {}", err);
            err_queue.fail(err.to_string());
        };

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                let queue = Arc::clone(&queue);
                device.build_input_stream(
                    &config.into(),
                    move |data: &[f32], _: &cpal::InputCallbackInfo| queue.push(data),
                    err_fn,
                    None,
                )
            }
            cpal::SampleFormat::I16 => {
                let queue = Arc::clone(&queue);
                device.build_input_stream(
                    &config.into(),
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let samples: Vec<f32> = data.iter().map(|&s| i16_to_f32(s)).collect();
                        queue.push(&samples);
                    },
                    err_fn,
                    None,
                )
            }
            cpal::SampleFormat::U16 => {
                let queue = Arc::clone(&queue);
                device.build_input_stream(
                    &config.into(),
                    move |data: &[u16], _: &cpal::InputCallbackInfo| {
                        let samples: Vec<f32> = data.iter().map(|&s| u16_to_f32(s)).collect();
                        queue.push(&samples);
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(CaptureError::StreamError(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| {
            if matches!(e, cpal::BuildStreamError::DeviceNotAvailable) {
                CaptureError::DeviceUnavailable(e.to_string())
            } else {
                CaptureError::StreamError(format!("failed to build input stream: {}", e))
            }
        })?;

        stream.play().map_err(|e| {
            if matches!(e, cpal::PlayStreamError::DeviceNotAvailable) {
                CaptureError::DeviceUnavailable(e.to_string())
            } else {
                CaptureError::StreamError(format!("failed to start stream: {}", e))
            }
        })?;

        Ok(Self {
            _stream: stream,
            queue,
            channels,
            sample_rate: actual_rate,
        })
    }
}

impl InputStream for CpalInputStream {
    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn default_block_frames(&self) -> usize {
        DEFAULT_BLOCK_FRAMES
    }

    fn read(&mut self, num_frames: usize, cancel: &StopSignal) -> Result<Option<FrameBlock>, CaptureError> {
        let count = num_frames * self.channels as usize;
        Ok(self
            .queue
            .read(count, cancel, STALL_TIMEOUT)?
            .map(|samples| FrameBlock::new(samples, self.channels)))
    }
}

/// Pick a supported config at `target_rate`, or the device default.
fn stream_config(
    device: &cpal::Device,
    kind: AudioSourceKind,
    target_rate: u32,
) -> Result<SupportedStreamConfig, CaptureError> {
    if let Some(config) = find_config_with_sample_rate(device, kind, target_rate) {
        return Ok(config);
    }
    let default = match kind {
        AudioSourceKind::Input => device.default_input_config(),
        AudioSourceKind::Loopback => device.default_output_config(),
    };
    default.map_err(|e| {
        if matches!(e, cpal::DefaultStreamConfigError::DeviceNotAvailable) {
            CaptureError::DeviceUnavailable(e.to_string())
        } else {
            CaptureError::StreamError(format!("no usable stream config: {}", e))
        }
    })
}

/// Sample formats the data callbacks convert, in order of preference.
const HANDLED_FORMATS: [cpal::SampleFormat; 3] = [
    cpal::SampleFormat::F32,
    cpal::SampleFormat::I16,
    cpal::SampleFormat::U16,
];

fn find_config_with_sample_rate(
    device: &cpal::Device,
    kind: AudioSourceKind,
    target_rate: u32,
) -> Option<SupportedStreamConfig> {
    let ranges: Vec<cpal::SupportedStreamConfigRange> = match kind {
        AudioSourceKind::Input => device.supported_input_configs().ok()?.collect(),
        AudioSourceKind::Loopback => device.supported_output_configs().ok()?.collect(),
    };
    pick_config(&ranges, target_rate)
}

/// First range in a handled format that covers `target_rate`.
fn pick_config(ranges: &[cpal::SupportedStreamConfigRange], target_rate: u32) -> Option<SupportedStreamConfig> {
    HANDLED_FORMATS.iter().find_map(|&format| {
        ranges
            .iter()
            .find(|range| {
                range.sample_format() == format
                    && range.min_sample_rate().0 <= target_rate
                    && target_rate <= range.max_sample_rate().0
            })
            .map(|range| range.clone().with_sample_rate(SampleRate(target_rate)))
    })
}

fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / i16::MAX as f32
}

fn u16_to_f32(sample: u16) -> f32 {
    (sample as f32 / u16::MAX as f32) * 2.0 - 1.0
}
