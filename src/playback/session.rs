// # Playback session
//
// One loaded asset plus the background tasks that feed its events into the
// controller. Every task is owned through a guard that aborts it on drop, so
// replacing or dropping a session tears its callbacks down with it.

use crate::source::{MediaSource, SourceStatus};
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc as tokio_mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

pub(crate) type SessionId = u64;

/// Tag for one uninterrupted run of a session. A new epoch starts on every
/// load and every restart from the beginning.
pub(crate) type Epoch = u64;

/// Source callbacks marshalled onto the controller task.
/// Each carries the epoch it was produced in so stale ones can be dropped.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    Resolved { epoch: Epoch, status: SourceStatus },
    Tick { epoch: Epoch, elapsed: Duration },
    EndOfMedia { epoch: Epoch },
    RestartDue { epoch: Epoch },
}

impl SessionEvent {
    pub(crate) fn epoch(&self) -> Epoch {
        match self {
            SessionEvent::Resolved { epoch, .. }
            | SessionEvent::Tick { epoch, .. }
            | SessionEvent::EndOfMedia { epoch }
            | SessionEvent::RestartDue { epoch } => *epoch,
        }
    }
}

/// The single live asset
#[derive(Debug, Clone)]
pub(crate) struct MediaSession {
    pub(crate) id: SessionId,
    /// Current run; events tagged with an older epoch are ignored
    pub(crate) epoch: Epoch,
    pub(crate) url: String,
    /// Known once the source reports ready
    pub(crate) duration: Option<Duration>,
    /// Last position applied by a tick or a seek
    pub(crate) position: Duration,
}

impl MediaSession {
    pub(crate) fn new(id: SessionId, url: String) -> Self {
        Self {
            id,
            epoch: id,
            url,
            duration: None,
            position: Duration::ZERO,
        }
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// In-flight `resolve` call for a session
pub(crate) struct PendingLoad {
    _task: AbortOnDrop,
}

impl PendingLoad {
    pub(crate) fn spawn(
        epoch: Epoch,
        url: String,
        source: Arc<dyn MediaSource>,
        events_tx: tokio_mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let status = source.resolve(&url).await;
            let _ = events_tx.send(SessionEvent::Resolved { epoch, status });
        });

        Self {
            _task: AbortOnDrop(task),
        }
    }
}

/// Periodic position registration for a ready session.
///
/// Forwards the source's tick and end-of-media streams until dropped.
pub(crate) struct TickSubscription {
    _task: AbortOnDrop,
}

impl TickSubscription {
    pub(crate) fn start(
        epoch: Epoch,
        mut ticks: BoxStream<'static, Duration>,
        mut ends: BoxStream<'static, ()>,
        events_tx: tokio_mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    Some(elapsed) = ticks.next() => SessionEvent::Tick { epoch, elapsed },
                    Some(()) = ends.next() => SessionEvent::EndOfMedia { epoch },
                    else => break,
                };

                if events_tx.send(event).is_err() {
                    break;
                }
            }
            trace!("Tick subscription for epoch {} finished", epoch);
        });

        Self {
            _task: AbortOnDrop(task),
        }
    }
}

/// Pending auto-restart after end of media
pub(crate) struct RestartTimer {
    _task: AbortOnDrop,
}

impl RestartTimer {
    pub(crate) fn schedule(
        epoch: Epoch,
        delay: Duration,
        events_tx: tokio_mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events_tx.send(SessionEvent::RestartDue { epoch });
        });

        Self {
            _task: AbortOnDrop(task),
        }
    }
}
