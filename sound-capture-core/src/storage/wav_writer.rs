use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::audio_models::WavSampleFormat;
use crate::models::error::CaptureError;
use crate::processing::{pcm, wav_format};

/// Streaming WAV file writer.
///
/// Writes a placeholder header on `open`, appends float samples converted
/// to the configured format, then patches the RIFF and data sizes on
/// `close` and returns the SHA-256 of the finished file.
///
/// ```text
/// [44-byte WAV header]
/// [little-endian PCM or IEEE float data...]
/// ```
pub struct WavFileWriter {
    file_path: PathBuf,
    format: WavSampleFormat,
    channels: u16,
    sample_rate: u32,
    file: Option<BufWriter<File>>,
    data_bytes: u64,
}

impl WavFileWriter {
    pub fn new(file_path: PathBuf, format: WavSampleFormat, channels: u16, sample_rate: u32) -> Self {
        Self {
            file_path,
            format,
            channels,
            sample_rate,
            file: None,
            data_bytes: 0,
        }
    }

    /// Create the file (and its parent directory) and write the initial header.
    pub fn open(&mut self) -> Result<(), CaptureError> {
        if self.file.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&self.file_path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create file: {}", e)))?;
        let mut file = BufWriter::new(file);

        let header = wav_format::generate_wav_header(self.sample_rate, self.format, self.channels, 0);
        file.write_all(&header)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;

        self.file = Some(file);
        self.data_bytes = 0;
        Ok(())
    }

    /// Append interleaved float samples.
    pub fn write_samples(&mut self, samples: &[f32]) -> Result<(), CaptureError> {
        let data = pcm::encode_samples(samples, self.format);
        wav_format::checked_data_size(self.data_bytes + data.len() as u64)?;

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("file is not open for writing".into()))?;
        file.write_all(&data)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;
        self.data_bytes += data.len() as u64;
        Ok(())
    }

    /// Finalize the header sizes, flush, and return the file's SHA-256 hex digest.
    pub fn close(&mut self) -> Result<String, CaptureError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?;
        let data_size = wav_format::checked_data_size(self.data_bytes)?;

        let io = |e: std::io::Error| CaptureError::StorageError(e.to_string());

        // RIFF chunk size at offset 4, data size at offset 40
        file.seek(SeekFrom::Start(4)).map_err(io)?;
        file.write_all(&(36 + data_size).to_le_bytes()).map_err(io)?;
        file.seek(SeekFrom::Start(40)).map_err(io)?;
        file.write_all(&data_size.to_le_bytes()).map_err(io)?;

        file.flush().map_err(io)?;
        file.get_ref().sync_all().map_err(io)?;
        drop(file);

        sha256_file(&self.file_path)
    }

    /// Bytes of sample data written so far (excluding the header).
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// Write a complete WAV file in one go and return its checksum.
pub fn write_wav_file(
    path: &Path,
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
    format: WavSampleFormat,
) -> Result<String, CaptureError> {
    let mut writer = WavFileWriter::new(path.to_path_buf(), format, channels, sample_rate);
    writer.open()?;
    writer.write_samples(samples)?;
    writer.close()
}

/// Compute SHA-256 hex digest of a file.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data =
        fs::read(path).map_err(|e| CaptureError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    Ok(hex_encode(&Sha256::digest(&data)))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
