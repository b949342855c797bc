//! Session directories and backup checkpoint files.
//!
//! ```text
//! <backup_root>/<session_timestamp>/backup_<timestamp>.wav
//! ```
//!
//! Checkpoints are 32-bit float WAVs so they hold the buffer exactly.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::audio_models::WavSampleFormat;
use crate::models::error::CaptureError;
use crate::storage::wav_writer;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Local wall-clock time formatted for file and directory names.
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// First path under `dir` named `<stem>.<ext>`, `<stem>_1.<ext>`, ... that does not exist yet.
pub fn unique_path(dir: &Path, stem: &str, ext: Option<&str>) -> PathBuf {
    let name = |suffix: usize| {
        let base = if suffix == 0 {
            stem.to_string()
        } else {
            format!("{}_{}", stem, suffix)
        };
        match ext {
            Some(ext) => format!("{}.{}", base, ext),
            None => base,
        }
    };

    let mut suffix = 0;
    loop {
        let candidate = dir.join(name(suffix));
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}

/// Create a fresh directory for one session's checkpoints.
///
/// Returns the directory and the timestamp it was named after.
pub fn create_session_dir(backup_root: &Path) -> Result<(PathBuf, String), CaptureError> {
    let session_ts = timestamp();
    let dir = unique_path(backup_root, &session_ts, None);
    fs::create_dir_all(&dir).map_err(|e| {
        CaptureError::StorageError(format!("failed to create session directory {}: {}", dir.display(), e))
    })?;
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or(session_ts);
    Ok((dir, name))
}

/// Write `samples` as `backup_<timestamp>.wav` in `session_dir`.
pub fn write_checkpoint(
    session_dir: &Path,
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
) -> Result<PathBuf, CaptureError> {
    let path = unique_path(session_dir, &format!("backup_{}", timestamp()), Some("wav"));
    wav_writer::write_wav_file(&path, samples, channels, sample_rate, WavSampleFormat::Float32)
        .map_err(|e| CaptureError::CheckpointWriteError(format!("{}: {}", path.display(), e)))?;
    Ok(path)
}
