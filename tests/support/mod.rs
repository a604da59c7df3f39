#![allow(dead_code)]

pub mod scripted_source;

pub use scripted_source::{ScriptedSource, SourceCall};

use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use vidctl::playback::{PlaybackProgress, PlaybackState};

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Next progress event, failing the test if none arrives in time
pub async fn next_progress(rx: &mut UnboundedReceiver<PlaybackProgress>) -> PlaybackProgress {
    match timeout(Duration::from_secs(30), rx.recv()).await {
        Ok(Some(progress)) => progress,
        Ok(None) => panic!("Progress channel closed"),
        Err(_) => panic!("Timed out waiting for playback progress"),
    }
}

/// Collect events up to and including the given state change
pub async fn wait_for_state(
    rx: &mut UnboundedReceiver<PlaybackProgress>,
    state: PlaybackState,
) -> Vec<PlaybackProgress> {
    let mut seen = Vec::new();
    loop {
        let progress = next_progress(rx).await;
        let done = progress == PlaybackProgress::StateChanged { state };
        seen.push(progress);
        if done {
            return seen;
        }
    }
}

/// Next position tick, skipping any other event
pub async fn wait_for_tick(rx: &mut UnboundedReceiver<PlaybackProgress>) -> (Duration, Duration) {
    loop {
        if let PlaybackProgress::PositionTick { elapsed, position } = next_progress(rx).await {
            return (elapsed, position);
        }
    }
}

/// Assert that nothing is published for `window`
pub async fn assert_quiet(rx: &mut UnboundedReceiver<PlaybackProgress>, window: Duration) {
    if let Ok(Some(progress)) = timeout(window, rx.recv()).await {
        panic!("Expected no progress, got {:?}", progress);
    }
}

/// Give spawned tasks a chance to run (and aborted ones to be dropped)
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
