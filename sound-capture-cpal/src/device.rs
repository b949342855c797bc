use cpal::traits::{DeviceTrait, HostTrait};

use sound_capture_core::{AudioSource, AudioSourceKind, CaptureError, InputDevice, InputStream};

use crate::stream::CpalInputStream;

/// Prefix of ids that name an output device captured through loopback.
pub const LOOPBACK_PREFIX: &str = "loopback:";

/// Stable id for a device: its name, prefixed for loopback sources.
pub fn device_id(kind: AudioSourceKind, name: &str) -> String {
    match kind {
        AudioSourceKind::Input => name.to_string(),
        AudioSourceKind::Loopback => format!("{}{}", LOOPBACK_PREFIX, name),
    }
}

/// Split an id produced by `device_id` back into kind and device name.
pub fn parse_device_id(id: &str) -> (AudioSourceKind, &str) {
    match id.strip_prefix(LOOPBACK_PREFIX) {
        Some(name) => (AudioSourceKind::Loopback, name),
        None => (AudioSourceKind::Input, id),
    }
}

/// Find a live device of `kind` by name.
pub(crate) fn find_device(
    host_id: cpal::HostId,
    kind: AudioSourceKind,
    name: &str,
) -> Result<Option<cpal::Device>, CaptureError> {
    let host = cpal::host_from_id(host_id)
        .map_err(|e| CaptureError::DeviceUnavailable(format!("audio host unavailable: {}", e)))?;
    let enumerate_failed = |e: cpal::DevicesError| {
        CaptureError::DeviceUnavailable(format!("failed to enumerate devices: {}", e))
    };
    let devices: Vec<cpal::Device> = match kind {
        AudioSourceKind::Input => host.input_devices().map_err(enumerate_failed)?.collect(),
        AudioSourceKind::Loopback => host.output_devices().map_err(enumerate_failed)?.collect(),
    };

    Ok(devices.into_iter().find(|d| d.name().map(|n| n == name).unwrap_or(false)))
}

/// A device remembered by name and re-resolved on every `open`.
///
/// Unplugging between sessions surfaces as `DeviceUnavailable` on the next
/// open instead of a stale handle.
#[derive(Debug, Clone)]
pub struct CpalDevice {
    host_id: cpal::HostId,
    source: AudioSource,
}

impl CpalDevice {
    pub(crate) fn new(host_id: cpal::HostId, source: AudioSource) -> Self {
        Self { host_id, source }
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }
}

impl InputDevice for CpalDevice {
    fn info(&self) -> AudioSource {
        self.source.clone()
    }

    fn open(&self, sample_rate: u32) -> Result<Box<dyn InputStream>, CaptureError> {
        let device = find_device(self.host_id, self.source.kind, &self.source.name)?.ok_or_else(|| {
            CaptureError::DeviceUnavailable(format!("'{}' is no longer connected", self.source.name))
        })?;
        log::debug!("Opening '{}' at {}Hz", self.source.name, sample_rate);
        let stream = CpalInputStream::open(&device, self.source.kind, sample_rate)?;
        Ok(Box::new(stream))
    }
}
