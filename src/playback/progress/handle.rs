use super::PlaybackProgress;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::debug;

type SubscriptionId = u64;
type ProgressSender = tokio_mpsc::UnboundedSender<PlaybackProgress>;
type Subscriptions = Arc<Mutex<HashMap<SubscriptionId, ProgressSender>>>;

/// Handle for subscribing to playback progress updates
#[derive(Clone)]
pub struct PlaybackProgressHandle {
    subscriptions: Subscriptions,
    next_id: Arc<AtomicU64>,
}

impl PlaybackProgressHandle {
    /// Create a new progress handle and spawn a task that fans updates out to subscribers
    pub fn new(
        mut progress_rx: tokio_mpsc::UnboundedReceiver<PlaybackProgress>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let subscriptions: Subscriptions = Arc::new(Mutex::new(HashMap::new()));
        let subscriptions_clone = subscriptions.clone();

        runtime_handle.spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                let mut subs = subscriptions_clone
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);

                // A failed send means the receiver was dropped
                subs.retain(|_, tx| tx.send(progress.clone()).is_ok());
            }
            debug!("Playback progress channel closed, exiting");
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to all playback progress updates published from now on.
    /// The subscription is removed once the receiver is dropped.
    pub fn subscribe_all(&self) -> tokio_mpsc::UnboundedReceiver<PlaybackProgress> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
        rx
    }
}
