use super::{MediaSource, SeekTolerance, SourceStatus};
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::{IntervalStream, UnboundedReceiverStream};
use tracing::{debug, info};

/// Media source that "plays" registered assets against the tokio clock.
///
/// No decoding happens: an asset is just a URL with a duration. Position
/// advances in real time while playing and end-of-media fires when it reaches
/// the duration. Runs on paused tokio time, which makes it usable in tests.
#[derive(Clone, Default)]
pub struct ClockSource {
    inner: Arc<Mutex<ClockState>>,
}

#[derive(Default)]
struct ClockState {
    catalog: HashMap<String, Duration>,
    load_latency: Duration,
    item: Option<ClockItem>,
    end_subscribers: Vec<mpsc::UnboundedSender<()>>,
    end_timer: Option<JoinHandle<()>>,
}

struct ClockItem {
    url: String,
    duration: Duration,
    /// Set while playing: the instant `anchor_position` was captured
    playing_since: Option<Instant>,
    anchor_position: Duration,
}

impl ClockItem {
    fn position(&self) -> Duration {
        match self.playing_since {
            Some(since) => (self.anchor_position + since.elapsed()).min(self.duration),
            None => self.anchor_position,
        }
    }
}

impl ClockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset that `resolve` will accept
    pub fn with_asset(self, url: impl Into<String>, duration: Duration) -> Self {
        self.lock().catalog.insert(url.into(), duration);
        self
    }

    /// Delay applied to every `resolve` call
    pub fn with_load_latency(self, latency: Duration) -> Self {
        self.lock().load_latency = latency;
        self
    }

    /// Whether the current item is advancing
    pub fn is_playing(&self) -> bool {
        self.lock()
            .item
            .as_ref()
            .is_some_and(|item| item.playing_since.is_some())
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-arm the end-of-media timer for the current item
    fn schedule_end(&self, state: &mut ClockState) {
        if let Some(timer) = state.end_timer.take() {
            timer.abort();
        }

        let remaining = match &state.item {
            Some(item) if item.playing_since.is_some() => {
                item.duration.saturating_sub(item.position())
            }
            _ => return,
        };

        let inner = self.inner.clone();
        state.end_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;

            let mut state = inner.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(item) = state.item.as_mut() {
                item.anchor_position = item.duration;
                item.playing_since = None;
                debug!("Clock source reached end of {}", item.url);
            }
            state.end_timer = None;
            state.end_subscribers.retain(|tx| tx.send(()).is_ok());
        }));
    }
}

#[async_trait::async_trait]
impl MediaSource for ClockSource {
    async fn resolve(&self, url: &str) -> SourceStatus {
        let latency = self.lock().load_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        if let Some(timer) = state.end_timer.take() {
            timer.abort();
        }
        state.end_subscribers.clear();

        match state.catalog.get(url).copied() {
            Some(duration) => {
                info!("Clock source loaded {} ({:?})", url, duration);
                state.item = Some(ClockItem {
                    url: url.to_string(),
                    duration,
                    playing_since: None,
                    anchor_position: Duration::ZERO,
                });
                SourceStatus::Ready { duration }
            }
            None => {
                state.item = None;
                SourceStatus::Failed {
                    reason: format!("No asset registered for {}", url),
                }
            }
        }
    }

    fn play(&self) {
        let mut state = self.lock();
        match state.item.as_mut() {
            Some(item) if item.playing_since.is_none() => {
                item.playing_since = Some(Instant::now());
            }
            _ => return,
        }
        self.schedule_end(&mut state);
    }

    fn pause(&self) {
        let mut state = self.lock();
        if let Some(item) = state.item.as_mut() {
            item.anchor_position = item.position();
            item.playing_since = None;
        }
        self.schedule_end(&mut state);
    }

    fn seek(&self, position: Duration, _tolerance: SeekTolerance) {
        // Every seek is exact here; there are no keyframes to snap to.
        let mut state = self.lock();
        if let Some(item) = state.item.as_mut() {
            item.anchor_position = position.min(item.duration);
            if item.playing_since.is_some() {
                item.playing_since = Some(Instant::now());
            }
        }
        self.schedule_end(&mut state);
    }

    fn current_position(&self) -> Duration {
        self.lock()
            .item
            .as_ref()
            .map(ClockItem::position)
            .unwrap_or_default()
    }

    fn ticks(&self, interval: Duration) -> BoxStream<'static, Duration> {
        let mut timer = tokio::time::interval_at(Instant::now() + interval, interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let source = self.clone();
        IntervalStream::new(timer)
            .map(move |_| source.current_position())
            .boxed()
    }

    fn end_of_media(&self) -> BoxStream<'static, ()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().end_subscribers.push(tx);
        UnboundedReceiverStream::new(rx).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_unknown_url_fails() {
        let source = ClockSource::new().with_asset("a.mp4", Duration::from_secs(20));

        let status = source.resolve("missing.mp4").await;

        assert!(matches!(status, SourceStatus::Failed { .. }));
        assert_eq!(source.current_position(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_advances_only_while_playing() {
        let source = ClockSource::new().with_asset("a.mp4", Duration::from_secs(20));
        assert_eq!(
            source.resolve("a.mp4").await,
            SourceStatus::Ready {
                duration: Duration::from_secs(20)
            }
        );

        source.play();
        tokio::time::sleep(Duration::from_secs(4)).await;
        source.pause();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(source.current_position(), Duration::from_secs(4));
        assert!(!source.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_media_fires_at_duration() {
        let source = ClockSource::new().with_asset("a.mp4", Duration::from_secs(5));
        source.resolve("a.mp4").await;
        let mut ends = source.end_of_media();

        source.play();
        let started = Instant::now();
        ends.next().await.expect("end of media");

        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert_eq!(source.current_position(), Duration::from_secs(5));
        assert!(!source.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_reschedules_end() {
        let source = ClockSource::new().with_asset("a.mp4", Duration::from_secs(10));
        source.resolve("a.mp4").await;
        let mut ends = source.end_of_media();

        source.play();
        source.seek(Duration::from_secs(8), SeekTolerance::ZERO);
        let started = Instant::now();
        ends.next().await.expect("end of media");

        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_report_position() {
        let source = ClockSource::new().with_asset("a.mp4", Duration::from_secs(10));
        source.resolve("a.mp4").await;
        let mut ticks = source.ticks(Duration::from_millis(500));

        source.play();
        let first = ticks.next().await.expect("tick");
        let second = ticks.next().await.expect("tick");

        assert_eq!(first, Duration::from_millis(500));
        assert_eq!(second, Duration::from_secs(1));
    }
}
