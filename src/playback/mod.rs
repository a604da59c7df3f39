pub mod error;
pub mod observer;
pub mod progress;
pub mod seek;
pub mod service;
mod session;

pub use error::LoadError;
pub use observer::PlaybackObserver;
pub use progress::PlaybackProgress;
pub use seek::SeekDirection;
pub use service::{PlaybackHandle, PlaybackService, PlaybackState};
