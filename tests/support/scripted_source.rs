use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use vidctl::source::{MediaSource, SeekTolerance, SourceStatus};

/// Calls the controller made on the source, in order
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCall {
    Resolve(String),
    Play,
    Pause,
    Seek(Duration, SeekTolerance),
}

struct Script {
    status: SourceStatus,
    latency: Duration,
}

#[derive(Default)]
struct ScriptState {
    scripts: HashMap<String, Script>,
    position: Duration,
    calls: Vec<SourceCall>,
    tick_intervals: Vec<Duration>,
    tick_txs: Vec<mpsc::UnboundedSender<Duration>>,
    end_txs: Vec<mpsc::UnboundedSender<()>>,
}

/// Mock media source for testing
///
/// Resolution results are scripted per URL. Ticks and end-of-media are
/// pushed by the test, and every control call is recorded.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    inner: Arc<Mutex<ScriptState>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.inner.lock().unwrap()
    }

    pub fn script(&self, url: &str, status: SourceStatus) {
        self.script_delayed(url, status, Duration::ZERO);
    }

    pub fn script_delayed(&self, url: &str, status: SourceStatus, latency: Duration) {
        self.lock()
            .scripts
            .insert(url.to_string(), Script { status, latency });
    }

    pub fn set_position(&self, position: Duration) {
        self.lock().position = position;
    }

    /// Deliver a tick to every live tick stream
    pub fn tick(&self, elapsed: Duration) {
        self.lock().tick_txs.retain(|tx| tx.send(elapsed).is_ok());
    }

    /// Deliver end-of-media to every live subscriber
    pub fn finish(&self) {
        self.lock().end_txs.retain(|tx| tx.send(()).is_ok());
    }

    /// Tick streams whose receiving end is still held by the controller
    pub fn live_tick_streams(&self) -> usize {
        self.lock()
            .tick_txs
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    pub fn live_end_streams(&self) -> usize {
        self.lock()
            .end_txs
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    pub fn tick_intervals(&self) -> Vec<Duration> {
        self.lock().tick_intervals.clone()
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Positions passed to `seek`, in order
    pub fn seeks(&self) -> Vec<Duration> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SourceCall::Seek(position, _) => Some(position),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl MediaSource for ScriptedSource {
    async fn resolve(&self, url: &str) -> SourceStatus {
        let (status, latency) = {
            let mut state = self.lock();
            state.calls.push(SourceCall::Resolve(url.to_string()));
            match state.scripts.get(url) {
                Some(script) => (script.status.clone(), script.latency),
                None => (
                    SourceStatus::Failed {
                        reason: format!("{} is not scripted", url),
                    },
                    Duration::ZERO,
                ),
            }
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.lock().position = Duration::ZERO;
        status
    }

    fn play(&self) {
        self.lock().calls.push(SourceCall::Play);
    }

    fn pause(&self) {
        self.lock().calls.push(SourceCall::Pause);
    }

    fn seek(&self, position: Duration, tolerance: SeekTolerance) {
        let mut state = self.lock();
        state.calls.push(SourceCall::Seek(position, tolerance));
        state.position = position;
    }

    fn current_position(&self) -> Duration {
        self.lock().position
    }

    fn ticks(&self, interval: Duration) -> BoxStream<'static, Duration> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        state.tick_intervals.push(interval);
        state.tick_txs.push(tx);
        UnboundedReceiverStream::new(rx).boxed()
    }

    fn end_of_media(&self) -> BoxStream<'static, ()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().end_txs.push(tx);
        UnboundedReceiverStream::new(rx).boxed()
    }
}
