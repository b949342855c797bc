//! Scripted devices and helpers shared by the session tests.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::audio_models::{AudioSource, AudioSourceKind, FrameBlock};
use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{RecordingState, Telemetry};
use crate::session::signal::StopSignal;
use crate::traits::input_device::{DeviceHost, InputDevice, InputStream};
use crate::traits::recorder_delegate::RecorderDelegate;

const MOCK_BLOCK_FRAMES: usize = 256;

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

enum FeedItem {
    Block(f32),
    Fail(String),
}

/// Test side of a fed stream: every call delivers exactly one read.
pub struct MockFeed {
    tx: Sender<FeedItem>,
}

impl MockFeed {
    /// Deliver one block of the requested size, every sample at `level`.
    pub fn block(&self, level: f32) {
        let _ = self.tx.send(FeedItem::Block(level));
    }

    /// Make the next read fail with a stream error.
    pub fn fail(&self, message: &str) {
        let _ = self.tx.send(FeedItem::Fail(message.to_string()));
    }
}

enum Script {
    FreeRunning(f32),
    Fed(Receiver<FeedItem>),
}

/// A device whose streams follow a queue of scripts, one per `open`.
///
/// Once the queue is empty further streams run free at the device's level.
pub struct MockDevice {
    id: String,
    channels: u16,
    level: f32,
    unplugged: Mutex<bool>,
    scripts: Mutex<VecDeque<Script>>,
    opens: Mutex<usize>,
}

impl MockDevice {
    fn build(id: &str, channels: u16, level: f32, scripts: Vec<Script>) -> Self {
        Self {
            id: id.to_string(),
            channels,
            level,
            unplugged: Mutex::new(false),
            scripts: Mutex::new(scripts.into()),
            opens: Mutex::new(0),
        }
    }

    /// Every stream delivers constant-level blocks as fast as they are read.
    pub fn free_running(id: &str, channels: u16, level: f32) -> Arc<Self> {
        Arc::new(Self::build(id, channels, level, Vec::new()))
    }

    /// The first stream opened only delivers what the feed sends.
    pub fn fed(id: &str, channels: u16) -> (Arc<Self>, MockFeed) {
        let (tx, rx) = mpsc::channel();
        let device = Self::build(id, channels, 0.1, vec![Script::Fed(rx)]);
        (Arc::new(device), MockFeed { tx })
    }

    /// A free-running first stream for the monitor, then a fed stream for capture.
    pub fn monitored_and_fed(id: &str, channels: u16) -> (Arc<Self>, MockFeed) {
        let (tx, rx) = mpsc::channel();
        let device = Self::build(id, channels, 0.1, vec![Script::FreeRunning(0.25), Script::Fed(rx)]);
        (Arc::new(device), MockFeed { tx })
    }

    /// Every `open` fails.
    pub fn unplugged(id: &str) -> Arc<Self> {
        let device = Self::build(id, 1, 0.0, Vec::new());
        *device.unplugged.lock() = true;
        Arc::new(device)
    }

    pub fn set_unplugged(&self, unplugged: bool) {
        *self.unplugged.lock() = unplugged;
    }

    pub fn opens(&self) -> usize {
        *self.opens.lock()
    }
}

impl InputDevice for MockDevice {
    fn info(&self) -> AudioSource {
        AudioSource {
            id: self.id.clone(),
            name: format!("Mock {}", self.id),
            kind: AudioSourceKind::Input,
            is_default: false,
            channels: Some(self.channels),
        }
    }

    fn open(&self, sample_rate: u32) -> Result<Box<dyn InputStream>, CaptureError> {
        if *self.unplugged.lock() {
            return Err(CaptureError::DeviceUnavailable(format!("'{}' is not connected", self.id)));
        }
        *self.opens.lock() += 1;
        let script = self
            .scripts
            .lock()
            .pop_front()
            .unwrap_or(Script::FreeRunning(self.level));
        Ok(Box::new(MockStream {
            channels: self.channels,
            sample_rate,
            script,
        }))
    }
}

struct MockStream {
    channels: u16,
    sample_rate: u32,
    script: Script,
}

impl InputStream for MockStream {
    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn default_block_frames(&self) -> usize {
        MOCK_BLOCK_FRAMES
    }

    fn read(&mut self, num_frames: usize, cancel: &StopSignal) -> Result<Option<FrameBlock>, CaptureError> {
        let samples = num_frames * self.channels as usize;
        match &self.script {
            Script::FreeRunning(level) => {
                if cancel.wait_timeout(Duration::from_millis(1)) {
                    return Ok(None);
                }
                Ok(Some(FrameBlock::new(vec![*level; samples], self.channels)))
            }
            Script::Fed(rx) => loop {
                if cancel.is_cancelled() {
                    return Ok(None);
                }
                match rx.recv_timeout(Duration::from_millis(5)) {
                    Ok(FeedItem::Block(level)) => {
                        return Ok(Some(FrameBlock::new(vec![level; samples], self.channels)));
                    }
                    Ok(FeedItem::Fail(message)) => return Err(CaptureError::StreamError(message)),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        if cancel.wait_timeout(Duration::from_millis(5)) {
                            return Ok(None);
                        }
                    }
                }
            },
        }
    }
}

/// Host over a fixed set of mock devices; the first one is the default.
pub struct MockHost {
    devices: Vec<Arc<MockDevice>>,
    by_id: HashMap<String, Arc<MockDevice>>,
}

impl MockHost {
    pub fn new(devices: Vec<Arc<MockDevice>>) -> Self {
        let by_id = devices.iter().map(|d| (d.id.clone(), Arc::clone(d))).collect();
        Self { devices, by_id }
    }
}

impl DeviceHost for MockHost {
    fn available_devices(&self) -> Result<Vec<AudioSource>, CaptureError> {
        Ok(self
            .devices
            .iter()
            .enumerate()
            .map(|(i, d)| AudioSource {
                is_default: i == 0,
                ..d.info()
            })
            .collect())
    }

    fn default_device(&self) -> Result<Arc<dyn InputDevice>, CaptureError> {
        self.devices
            .first()
            .map(|d| Arc::clone(d) as Arc<dyn InputDevice>)
            .ok_or_else(|| CaptureError::DeviceUnavailable("no input devices".into()))
    }

    fn device(&self, id: &str) -> Result<Arc<dyn InputDevice>, CaptureError> {
        self.by_id
            .get(id)
            .map(|d| Arc::clone(d) as Arc<dyn InputDevice>)
            .ok_or_else(|| CaptureError::DeviceUnavailable(format!("no device with id '{}'", id)))
    }
}

/// Delegate that records every callback it receives.
#[derive(Default)]
pub struct RecordingDelegate {
    pub states: Mutex<Vec<RecordingState>>,
    pub errors: Mutex<Vec<CaptureError>>,
    pub checkpoints: Mutex<Vec<PathBuf>>,
    pub telemetry: Mutex<Vec<Telemetry>>,
    pub finished: Mutex<Vec<RecordingResult>>,
}

impl RecorderDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: RecordingState) {
        self.states.lock().push(state);
    }

    fn on_telemetry(&self, telemetry: &Telemetry) {
        self.telemetry.lock().push(telemetry.clone());
    }

    fn on_checkpoint_written(&self, path: &Path) {
        self.checkpoints.lock().push(path.to_path_buf());
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        self.finished.lock().push(result.clone());
    }
}
