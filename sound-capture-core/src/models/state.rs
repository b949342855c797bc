use std::fmt;

use serde::Serialize;

use super::audio_models::LevelSnapshot;

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → recording ⇄ paused
///            ↓         ↓
///          stopped ← ──┘   (stop, or a stream failure)
///            ↓
///          idle            (after finalize or discard)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl RecordingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Recording or paused: the window in which backups run.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }

    pub fn record_button_label(&self) -> RecordButtonLabel {
        if self.is_idle() {
            RecordButtonLabel::Record
        } else {
            RecordButtonLabel::Stop
        }
    }
}

/// What the single record/stop button should offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordButtonLabel {
    Record,
    Stop,
}

/// Content of the elapsed-time label.
///
/// The `Display` impl gives the untranslated default text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "elapsed", rename_all = "lowercase")]
pub enum TimeLabel {
    Idle,
    Recording(String),
    Paused,
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("00:00:00"),
            Self::Recording(elapsed) => write!(f, "[REC {}]", elapsed),
            Self::Paused => f.write_str("PAUSED"),
        }
    }
}

/// One UI refresh worth of recorder state.
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub state: RecordingState,
    pub levels: LevelSnapshot,
    pub elapsed_secs: f64,
    pub elapsed: String,
    pub time_label: TimeLabel,
    pub record_button: RecordButtonLabel,
}

impl Telemetry {
    pub fn new(state: RecordingState, levels: LevelSnapshot, elapsed_secs: f64) -> Self {
        let elapsed = format_elapsed(elapsed_secs);
        let time_label = match state {
            RecordingState::Idle => TimeLabel::Idle,
            RecordingState::Paused => TimeLabel::Paused,
            RecordingState::Recording | RecordingState::Stopped => {
                TimeLabel::Recording(elapsed.clone())
            }
        };
        Self {
            state,
            levels,
            elapsed_secs,
            elapsed,
            time_label,
            record_button: state.record_button_label(),
        }
    }
}

/// Format seconds as `HH:MM:SS`, truncating fractions.
pub fn format_elapsed(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
