pub mod input_device;
pub mod recorder_delegate;
