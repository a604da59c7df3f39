mod clock;

pub use clock::ClockSource;

use futures::stream::BoxStream;
use std::time::Duration;

/// Outcome of resolving an asset URL
#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    /// Asset is playable; duration is known
    Ready { duration: Duration },
    /// Asset could not be resolved or is not playable
    Failed { reason: String },
    /// Resolution was aborted by the engine
    Cancelled,
    /// Engine reported a status the controller does not recognize
    Unknown,
}

/// How far the engine may land from the requested seek target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTolerance {
    pub before: Duration,
    pub after: Duration,
}

impl SeekTolerance {
    /// Exact-position seek, no snapping to a nearby decode point
    pub const ZERO: SeekTolerance = SeekTolerance {
        before: Duration::ZERO,
        after: Duration::ZERO,
    };
}

/// Trait for media engines driven by the playback controller (allows mocking for tests)
///
/// The controller calls these methods from a single task. Streams returned by
/// `ticks` and `end_of_media` are owned by the controller and dropped when the
/// session they belong to ends.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    /// Load the asset behind `url` and report whether it can be played.
    /// Replaces whatever item the engine held before.
    async fn resolve(&self, url: &str) -> SourceStatus;

    fn play(&self);

    fn pause(&self);

    fn seek(&self, position: Duration, tolerance: SeekTolerance);

    fn current_position(&self) -> Duration;

    /// Periodic stream of the engine's clock, one item per `interval`
    fn ticks(&self, interval: Duration) -> BoxStream<'static, Duration>;

    /// Yields once each time the current item plays to its end
    fn end_of_media(&self) -> BoxStream<'static, ()>;
}
