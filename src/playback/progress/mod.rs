pub mod handle;

use crate::playback::error::LoadError;
use crate::playback::observer::PlaybackObserver;
use crate::playback::service::PlaybackState;
pub use handle::PlaybackProgressHandle;
use std::time::Duration;
use tokio::sync::mpsc as tokio_mpsc;

/// Progress updates during playback
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackProgress {
    StateChanged {
        state: PlaybackState,
    },
    DurationKnown {
        duration: Duration,
    },
    PositionTick {
        elapsed: Duration,
        position: Duration,
    },
    LoadFailed {
        error: LoadError,
    },
}

/// Observer that republishes every notification on the progress channel
pub(crate) struct ProgressObserver {
    progress_tx: tokio_mpsc::UnboundedSender<PlaybackProgress>,
}

impl ProgressObserver {
    pub(crate) fn new(progress_tx: tokio_mpsc::UnboundedSender<PlaybackProgress>) -> Self {
        Self { progress_tx }
    }

    fn publish(&self, progress: PlaybackProgress) {
        // Receiver is gone only once the dispatcher task has exited
        let _ = self.progress_tx.send(progress);
    }
}

impl PlaybackObserver for ProgressObserver {
    fn on_state_changed(&mut self, state: PlaybackState) {
        self.publish(PlaybackProgress::StateChanged { state });
    }

    fn on_duration_known(&mut self, duration: Duration) {
        self.publish(PlaybackProgress::DurationKnown { duration });
    }

    fn on_position_tick(&mut self, elapsed: Duration, position: Duration) {
        self.publish(PlaybackProgress::PositionTick { elapsed, position });
    }

    fn on_load_failed(&mut self, error: &LoadError) {
        self.publish(PlaybackProgress::LoadFailed {
            error: error.clone(),
        });
    }
}
