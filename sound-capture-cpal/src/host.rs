use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait};

use sound_capture_core::{AudioSource, AudioSourceKind, CaptureError, DeviceHost, InputDevice};

use crate::device::{device_id, find_device, parse_device_id, CpalDevice};

/// `DeviceHost` over a cpal audio host.
///
/// Lists input devices, plus output devices as loopback sources on Windows
/// where WASAPI can record what they play.
#[derive(Debug, Clone, Copy)]
pub struct CpalHost {
    host_id: cpal::HostId,
}

impl CpalHost {
    /// The platform's default audio host.
    pub fn new() -> Self {
        Self {
            host_id: cpal::default_host().id(),
        }
    }

    pub fn with_host(host_id: cpal::HostId) -> Self {
        Self { host_id }
    }

    fn host(&self) -> Result<cpal::Host, CaptureError> {
        cpal::host_from_id(self.host_id)
            .map_err(|e| CaptureError::DeviceUnavailable(format!("audio host unavailable: {}", e)))
    }

    fn describe(&self, device: &cpal::Device, kind: AudioSourceKind, default_name: Option<&str>) -> Option<AudioSource> {
        let name = device.name().ok()?;
        let channels = match kind {
            AudioSourceKind::Input => device.default_input_config(),
            AudioSourceKind::Loopback => device.default_output_config(),
        }
        .ok()
        .map(|config| config.channels());

        Some(AudioSource {
            id: device_id(kind, &name),
            is_default: default_name == Some(name.as_str()),
            name,
            kind,
            channels,
        })
    }

    fn resolve(&self, kind: AudioSourceKind, name: &str) -> Result<Arc<dyn InputDevice>, CaptureError> {
        let device = find_device(self.host_id, kind, name)?
            .ok_or_else(|| CaptureError::DeviceUnavailable(format!("no device named '{}'", name)))?;
        let default_name = match kind {
            AudioSourceKind::Input => self.host()?.default_input_device().and_then(|d| d.name().ok()),
            AudioSourceKind::Loopback => None,
        };
        let source = self
            .describe(&device, kind, default_name.as_deref())
            .ok_or_else(|| CaptureError::DeviceUnavailable(format!("'{}' did not respond", name)))?;
        Ok(Arc::new(CpalDevice::new(self.host_id, source)))
    }
}

impl Default for CpalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceHost for CpalHost {
    fn available_devices(&self) -> Result<Vec<AudioSource>, CaptureError> {
        let host = self.host()?;
        let default_input = host.default_input_device().and_then(|d| d.name().ok());

        let mut sources: Vec<AudioSource> = host
            .input_devices()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to enumerate input devices: {}", e)))?
            .filter_map(|d| self.describe(&d, AudioSourceKind::Input, default_input.as_deref()))
            .collect();

        if cfg!(target_os = "windows") {
            match host.output_devices() {
                Ok(outputs) => sources.extend(
                    outputs.filter_map(|d| self.describe(&d, AudioSourceKind::Loopback, None)),
                ),
                Err(e) => log::warn!("Skipping loopback sources: {}", e),
            }
        }

        Ok(sources)
    }

    fn default_device(&self) -> Result<Arc<dyn InputDevice>, CaptureError> {
        let name = self
            .host()?
            .default_input_device()
            .and_then(|d| d.name().ok())
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into()))?;
        self.resolve(AudioSourceKind::Input, &name)
    }

    fn device(&self, id: &str) -> Result<Arc<dyn InputDevice>, CaptureError> {
        let (kind, name) = parse_device_id(id);
        self.resolve(kind, name)
    }
}
