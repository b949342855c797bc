pub mod checkpoint;
pub mod flac;
pub mod metadata;
pub mod wav_writer;
