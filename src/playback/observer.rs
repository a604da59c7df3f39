use crate::playback::error::LoadError;
use crate::playback::service::PlaybackState;
use std::time::Duration;

/// Receives notifications from the playback controller.
///
/// All methods run on the controller task, one at a time, in the order the
/// transitions happen. Implementations must not block. Commands issued from
/// inside a callback through a `PlaybackHandle` are queued and handled after
/// the current transition completes.
pub trait PlaybackObserver: Send {
    fn on_state_changed(&mut self, state: PlaybackState);

    /// Called once per session, right after the source becomes ready
    fn on_duration_known(&mut self, duration: Duration);

    /// Periodic time sync while Playing; both values lie in `[0, duration]`
    fn on_position_tick(&mut self, elapsed: Duration, position: Duration);

    fn on_load_failed(&mut self, error: &LoadError);
}
