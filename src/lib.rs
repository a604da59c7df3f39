// Library exports for the binary and integration tests

pub mod config;
pub mod display;
pub mod playback;
pub mod source;

pub use config::Config;
pub use playback::{PlaybackHandle, PlaybackService, PlaybackState};
