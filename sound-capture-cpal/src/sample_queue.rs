use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use sound_capture_core::{CaptureError, StopSignal};

/// How often a blocked reader re-checks cancellation.
const POLL_SLICE: Duration = Duration::from_millis(50);

/// Fixed-capacity circular buffer of interleaved samples.
///
/// Overflow drops the oldest samples.
#[derive(Debug)]
struct RingBuffer {
    buffer: Vec<f32>,
    write_index: usize,
    read_index: usize,
    available: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_index: 0,
            read_index: 0,
            available: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Write samples, returning how many old samples were dropped to make room.
    fn write(&mut self, samples: &[f32]) -> usize {
        let capacity = self.capacity();
        let mut dropped = samples.len().saturating_sub(capacity);
        let samples = &samples[dropped..];

        let overflow = (self.available + samples.len()).saturating_sub(capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % capacity;
            self.available -= overflow;
            dropped += overflow;
        }

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % capacity;
        }
        self.available += samples.len();
        dropped
    }

    fn read(&mut self, count: usize) -> Vec<f32> {
        let to_read = count.min(self.available);
        let capacity = self.capacity();
        let result = (0..to_read)
            .map(|i| self.buffer[(self.read_index + i) % capacity])
            .collect();
        self.read_index = (self.read_index + to_read) % capacity;
        self.available -= to_read;
        result
    }
}

#[derive(Debug)]
struct QueueInner {
    ring: RingBuffer,
    failure: Option<String>,
    overflowing: bool,
}

/// Hand-off between a cpal data callback and the thread reading the stream.
///
/// The callback pushes without ever blocking on the reader; the reader
/// blocks until enough samples arrive, the stream fails, or it is cancelled.
#[derive(Debug)]
pub struct SampleQueue {
    inner: Mutex<QueueInner>,
    ready: Condvar,
}

impl SampleQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                ring: RingBuffer::new(capacity),
                failure: None,
                overflowing: false,
            }),
            ready: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().ring.capacity()
    }

    pub fn available(&self) -> usize {
        self.inner.lock().ring.available
    }

    /// Called from the audio callback.
    pub fn push(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        let dropped = inner.ring.write(samples);
        if dropped > 0 && !inner.overflowing {
            log::warn!("Input queue overflow: reader is behind, dropped {} samples", dropped);
        }
        inner.overflowing = dropped > 0;
        drop(inner);
        self.ready.notify_all();
    }

    /// Mark the stream failed. Pending and future reads return the error.
    pub fn fail(&self, message: String) {
        let mut inner = self.inner.lock();
        if inner.failure.is_none() {
            inner.failure = Some(message);
        }
        drop(inner);
        self.ready.notify_all();
    }

    /// Block until `count` samples are queued and take them.
    ///
    /// Returns `Ok(None)` once `cancel` fires. A stream that delivers nothing
    /// for `stall_timeout` is treated as failed.
    pub fn read(
        &self,
        count: usize,
        cancel: &StopSignal,
        stall_timeout: Duration,
    ) -> Result<Option<Vec<f32>>, CaptureError> {
        let mut inner = self.inner.lock();
        if count > inner.ring.capacity() {
            return Err(CaptureError::ConfigurationFailed(format!(
                "read of {} samples exceeds queue capacity {}",
                count,
                inner.ring.capacity()
            )));
        }

        let mut last_available = inner.ring.available;
        let mut last_progress = Instant::now();
        loop {
            if let Some(message) = &inner.failure {
                return Err(CaptureError::StreamError(message.clone()));
            }
            if inner.ring.available >= count {
                return Ok(Some(inner.ring.read(count)));
            }
            if cancel.is_cancelled() {
                return Ok(None);
            }

            if inner.ring.available != last_available {
                last_available = inner.ring.available;
                last_progress = Instant::now();
            } else if last_progress.elapsed() >= stall_timeout {
                return Err(CaptureError::StreamError(format!(
                    "no audio delivered for {:.1}s",
                    stall_timeout.as_secs_f64()
                )));
            }
            self.ready.wait_for(&mut inner, POLL_SLICE);
        }
    }
}
