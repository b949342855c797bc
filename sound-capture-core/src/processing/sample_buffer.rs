use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::models::audio_models::FrameBlock;
use crate::models::error::CaptureError;

/// Append-only buffer holding the current take as interleaved frames.
///
/// One writer (the capture engine) appends whole blocks under the write
/// lock and then publishes the new frame count. Readers only ever see fully
/// appended prefixes: `frames()` reads the published count, `snapshot()`
/// copies under the read lock. `seal()` hands the contents to finalize and
/// rejects every later append, so nothing can grow the take after handoff.
#[derive(Debug)]
pub struct SampleBuffer {
    channels: u16,
    sample_rate: u32,
    inner: RwLock<BufferInner>,
    published_frames: AtomicUsize,
}

#[derive(Debug, Default)]
struct BufferInner {
    samples: Vec<f32>,
    sealed: bool,
}

impl SampleBuffer {
    pub fn new(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels: channels.max(1),
            sample_rate,
            inner: RwLock::new(BufferInner::default()),
            published_frames: AtomicUsize::new(0),
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Append a block. Returns `Ok(false)` once the buffer has been sealed.
    pub fn append(&self, block: &FrameBlock) -> Result<bool, CaptureError> {
        if block.channels() != self.channels {
            return Err(CaptureError::ConfigurationFailed(format!(
                "block has {} channels, buffer expects {}",
                block.channels(),
                self.channels
            )));
        }

        let mut inner = self.inner.write();
        if inner.sealed {
            return Ok(false);
        }
        inner.samples.extend_from_slice(block.samples());
        let frames = inner.samples.len() / self.channels as usize;
        self.published_frames.store(frames, Ordering::Release);
        Ok(true)
    }

    /// Frames appended so far. Never decreases until the buffer is sealed.
    pub fn frames(&self) -> usize {
        self.published_frames.load(Ordering::Acquire)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate.max(1) as f64
    }

    /// Copy of every sample appended so far.
    pub fn snapshot(&self) -> Vec<f32> {
        self.inner.read().samples.clone()
    }

    /// Take the contents and refuse further appends.
    ///
    /// A second call returns an empty vector. The published frame count is
    /// left as it was so telemetry of the finished take does not jump back.
    pub fn seal(&self) -> Vec<f32> {
        let mut inner = self.inner.write();
        inner.sealed = true;
        std::mem::take(&mut inner.samples)
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.read().sealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn block(frames: usize, value: f32) -> FrameBlock {
        FrameBlock::new(vec![value; frames * 2], 2)
    }

    #[test]
    fn append_grows_in_order() {
        let buf = SampleBuffer::new(2, 48000);
        assert!(buf.append(&block(2, 0.1)).unwrap());
        assert!(buf.append(&block(1, 0.2)).unwrap());

        assert_eq!(buf.frames(), 3);
        assert_eq!(buf.snapshot(), vec![0.1, 0.1, 0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn rejects_channel_mismatch() {
        let buf = SampleBuffer::new(2, 48000);
        let mono = FrameBlock::new(vec![0.0; 4], 1);
        assert!(buf.append(&mono).is_err());
        assert_eq!(buf.frames(), 0);
    }

    #[test]
    fn seal_takes_contents_and_blocks_appends() {
        let buf = SampleBuffer::new(2, 48000);
        buf.append(&block(4, 0.5)).unwrap();

        let samples = buf.seal();
        assert_eq!(samples.len(), 8);
        assert!(buf.is_sealed());
        assert!(!buf.append(&block(1, 0.5)).unwrap());
        assert!(buf.seal().is_empty());
    }

    #[test]
    fn duration_from_frames() {
        let buf = SampleBuffer::new(2, 4);
        buf.append(&block(6, 0.0)).unwrap();
        assert_eq!(buf.duration_secs(), 1.5);
    }

    #[test]
    fn readers_never_see_partial_blocks() {
        let buf = Arc::new(SampleBuffer::new(2, 48000));
        let writer = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                for _ in 0..200 {
                    buf.append(&block(64, 0.25)).unwrap();
                }
            })
        };

        let mut last = 0;
        while !writer.is_finished() {
            let frames = buf.frames();
            assert!(frames >= last, "published length went backwards");
            assert_eq!(frames % 64, 0);
            let snapshot = buf.snapshot();
            assert_eq!(snapshot.len() % (64 * 2), 0);
            last = frames;
        }
        writer.join().unwrap();
        assert_eq!(buf.frames(), 200 * 64);
    }
}
