pub mod assembler;
pub mod buffer;
pub mod decode;
pub mod export;
#[cfg(feature = "cpal-audio")]
pub mod output;
pub mod playback;
pub mod source;
