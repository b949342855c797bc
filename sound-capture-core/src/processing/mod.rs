pub mod gain;
pub mod level_meter;
pub mod pcm;
pub mod sample_buffer;
pub mod silence;
pub mod wav_format;
