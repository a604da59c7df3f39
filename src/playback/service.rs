use crate::config::Config;
use crate::playback::error::LoadError;
use crate::playback::observer::PlaybackObserver;
use crate::playback::progress::{PlaybackProgress, PlaybackProgressHandle, ProgressObserver};
use crate::playback::seek::{clamp_position, relative_target, SeekDirection};
use crate::playback::session::{
    Epoch, MediaSession, PendingLoad, RestartTimer, SessionEvent, TickSubscription,
};
use crate::source::{MediaSource, SeekTolerance, SourceStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc as tokio_mpsc, oneshot};
use tracing::{debug, info, trace, warn};

/// Playback commands sent to the service
#[derive(Debug)]
pub enum PlaybackCommand {
    Load(String),
    PlayPause,
    /// Absolute position in seconds, clamped to the asset
    Seek(f64),
    SeekRelative {
        direction: SeekDirection,
        amount_secs: f64,
    },
    Shutdown(oneshot::Sender<()>),
}

/// Current playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Stopped,
}

/// Handle to the playback service for sending commands
#[derive(Clone)]
pub struct PlaybackHandle {
    command_tx: tokio_mpsc::UnboundedSender<PlaybackCommand>,
    progress_handle: PlaybackProgressHandle,
}

impl PlaybackHandle {
    /// Replace the current session with `url`; readiness arrives asynchronously
    pub fn load(&self, url: impl Into<String>) {
        let _ = self.command_tx.send(PlaybackCommand::Load(url.into()));
    }

    pub fn play_pause(&self) {
        let _ = self.command_tx.send(PlaybackCommand::PlayPause);
    }

    pub fn seek(&self, to_secs: f64) {
        let _ = self.command_tx.send(PlaybackCommand::Seek(to_secs));
    }

    pub fn seek_relative(&self, direction: SeekDirection, amount_secs: f64) {
        let _ = self.command_tx.send(PlaybackCommand::SeekRelative {
            direction,
            amount_secs,
        });
    }

    pub fn subscribe_progress(&self) -> tokio_mpsc::UnboundedReceiver<PlaybackProgress> {
        self.progress_handle.subscribe_all()
    }

    /// Stop the service. Returns once the ticker, any pending restart and any
    /// in-flight load have been cancelled; no observer is called afterwards.
    pub async fn shutdown(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.command_tx.send(PlaybackCommand::Shutdown(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }
}

/// Playback service that owns the state machine and the live session
pub struct PlaybackService {
    config: Config,
    source: Arc<dyn MediaSource>,
    observers: Vec<Box<dyn PlaybackObserver>>,
    command_rx: tokio_mpsc::UnboundedReceiver<PlaybackCommand>,
    events_tx: tokio_mpsc::UnboundedSender<SessionEvent>,
    events_rx: tokio_mpsc::UnboundedReceiver<SessionEvent>,
    state: PlaybackState,
    session: Option<MediaSession>,
    next_epoch: Epoch,
    pending_load: Option<PendingLoad>,
    ticker: Option<TickSubscription>,
    restart: Option<RestartTimer>,
}

impl PlaybackService {
    pub fn start(
        config: Config,
        source: Arc<dyn MediaSource>,
        runtime_handle: tokio::runtime::Handle,
    ) -> PlaybackHandle {
        Self::start_with_observers(config, source, Vec::new(), runtime_handle)
    }

    /// Start the service with extra observers. They are notified after the
    /// progress channel, in the order given.
    pub fn start_with_observers(
        config: Config,
        source: Arc<dyn MediaSource>,
        observers: Vec<Box<dyn PlaybackObserver>>,
        runtime_handle: tokio::runtime::Handle,
    ) -> PlaybackHandle {
        let (command_tx, command_rx) = tokio_mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = tokio_mpsc::unbounded_channel();

        let progress_handle = PlaybackProgressHandle::new(progress_rx, runtime_handle.clone());

        let mut all_observers: Vec<Box<dyn PlaybackObserver>> =
            vec![Box::new(ProgressObserver::new(progress_tx))];
        all_observers.extend(observers);

        let service = PlaybackService::new(config, source, all_observers, command_rx);
        runtime_handle.spawn(service.run());

        PlaybackHandle {
            command_tx,
            progress_handle,
        }
    }

    fn new(
        config: Config,
        source: Arc<dyn MediaSource>,
        observers: Vec<Box<dyn PlaybackObserver>>,
        command_rx: tokio_mpsc::UnboundedReceiver<PlaybackCommand>,
    ) -> Self {
        let (events_tx, events_rx) = tokio_mpsc::unbounded_channel();

        PlaybackService {
            config,
            source,
            observers,
            command_rx,
            events_tx,
            events_rx,
            state: PlaybackState::Idle,
            session: None,
            next_epoch: 1,
            pending_load: None,
            ticker: None,
            restart: None,
        }
    }

    async fn run(mut self) {
        info!("PlaybackService started");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(PlaybackCommand::Shutdown(ack)) => {
                        self.teardown();
                        let _ = ack.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
        }

        self.teardown();
        info!("PlaybackService stopped");
    }

    fn handle_command(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Load(url) => self.load(url),
            PlaybackCommand::PlayPause => self.play_pause(),
            PlaybackCommand::Seek(to_secs) => self.seek(to_secs),
            PlaybackCommand::SeekRelative {
                direction,
                amount_secs,
            } => self.seek_relative(direction, amount_secs),
            // Intercepted by the run loop
            PlaybackCommand::Shutdown(_) => {}
        }
    }

    fn handle_event(&mut self, event: SessionEvent) {
        let current = self.session.as_ref().map(|session| session.epoch);
        if current != Some(event.epoch()) {
            trace!("Dropping stale event: {:?}", event);
            return;
        }

        match event {
            SessionEvent::Resolved { status, .. } => self.on_resolved(status),
            SessionEvent::Tick { elapsed, .. } => self.on_tick(elapsed),
            SessionEvent::EndOfMedia { .. } => self.on_end_of_media(),
            SessionEvent::RestartDue { .. } => self.on_restart_due(),
        }
    }

    /// Drop the live session and every task feeding it
    fn teardown(&mut self) {
        self.ticker = None;
        self.restart = None;
        self.pending_load = None;
        if let Some(session) = self.session.take() {
            debug!(
                "Released session {} ({}) at {:?}",
                session.id, session.url, session.position
            );
        }
    }

    fn load(&mut self, url: String) {
        if self.state == PlaybackState::Playing {
            self.source.pause();
        }
        self.teardown();

        let id = self.advance_epoch();

        info!("Loading {} (session {})", url, id);

        self.session = Some(MediaSession::new(id, url.clone()));
        self.set_state(PlaybackState::Loading);
        self.pending_load = Some(PendingLoad::spawn(
            id,
            url,
            self.source.clone(),
            self.events_tx.clone(),
        ));
    }

    fn on_resolved(&mut self, status: SourceStatus) {
        self.pending_load = None;

        let duration = match status {
            SourceStatus::Ready { duration } => duration,
            SourceStatus::Failed { reason } => return self.fail_load(LoadError::Failed { reason }),
            SourceStatus::Cancelled => return self.fail_load(LoadError::Cancelled),
            SourceStatus::Unknown => return self.fail_load(LoadError::UnknownStatus),
        };

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.duration = Some(duration);
        info!("Session {} ready, duration {:?}", session.id, duration);
        let epoch = session.epoch;

        for observer in &mut self.observers {
            observer.on_duration_known(duration);
        }

        self.start_playing(epoch);
    }

    fn advance_epoch(&mut self) -> Epoch {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        epoch
    }

    /// Subscribe to the source for `epoch`, start it and report Playing
    fn start_playing(&mut self, epoch: Epoch) {
        let ticks = self.source.ticks(self.config.tick_interval);
        let ends = self.source.end_of_media();
        self.source.play();
        self.ticker = Some(TickSubscription::start(
            epoch,
            ticks,
            ends,
            self.events_tx.clone(),
        ));

        self.set_state(PlaybackState::Playing);
    }

    fn fail_load(&mut self, error: LoadError) {
        if let Some(session) = self.session.take() {
            warn!("Could not load {}: {}", session.url, error);
        }

        for observer in &mut self.observers {
            observer.on_load_failed(&error);
        }
        self.set_state(PlaybackState::Idle);
    }

    fn on_tick(&mut self, elapsed: Duration) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let position = self.source.current_position();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(duration) = session.duration else {
            return;
        };

        let elapsed = elapsed.min(duration);
        let position = position.min(duration);
        session.position = position;

        for observer in &mut self.observers {
            observer.on_position_tick(elapsed, position);
        }
    }

    fn on_end_of_media(&mut self) {
        if self.state != PlaybackState::Playing {
            debug!("Ignoring end of media while {:?}", self.state);
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(duration) = session.duration {
            session.position = duration;
        }
        info!("Session {} reached the end of {}", session.id, session.url);
        let epoch = session.epoch;

        self.set_state(PlaybackState::Stopped);
        self.restart = Some(RestartTimer::schedule(
            epoch,
            self.config.restart_delay,
            self.events_tx.clone(),
        ));
    }

    fn on_restart_due(&mut self) {
        self.restart = None;
        if self.state != PlaybackState::Stopped {
            return;
        }
        info!("Restarting playback from the beginning");
        self.restart_from_beginning();
    }

    /// Start a new run of the current session. Ticks, end-of-media and
    /// restart events still queued from the previous run are dropped.
    fn restart_from_beginning(&mut self) {
        let epoch = self.advance_epoch();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.epoch = epoch;
        self.ticker = None;
        self.restart = None;

        self.apply_seek(Duration::ZERO);
        self.start_playing(epoch);
    }

    fn play_pause(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                self.source.pause();
                self.set_state(PlaybackState::Paused);
            }
            PlaybackState::Paused => {
                self.source.play();
                self.set_state(PlaybackState::Playing);
            }
            PlaybackState::Stopped => self.restart_from_beginning(),
            PlaybackState::Idle | PlaybackState::Loading => {
                debug!("Ignoring play/pause while {:?}", self.state);
            }
        }
    }

    /// Duration of the live session, if it has become ready
    fn ready_duration(&self) -> Option<Duration> {
        self.session.as_ref().and_then(|session| session.duration)
    }

    fn seek(&mut self, to_secs: f64) {
        let Some(duration) = self.ready_duration() else {
            debug!("Ignoring seek to {}s: nothing loaded", to_secs);
            return;
        };
        self.apply_seek(clamp_position(to_secs, duration));
    }

    fn seek_relative(&mut self, direction: SeekDirection, amount_secs: f64) {
        let Some(duration) = self.ready_duration() else {
            debug!("Ignoring {:?} seek: nothing loaded", direction);
            return;
        };
        let current = self.source.current_position();
        self.apply_seek(relative_target(current, direction, amount_secs, duration));
    }

    fn apply_seek(&mut self, target: Duration) {
        debug!("Seeking to {:?}", target);
        self.source.seek(target, SeekTolerance::ZERO);
        if let Some(session) = self.session.as_mut() {
            session.position = target;
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
        for observer in &mut self.observers {
            observer.on_state_changed(state);
        }
    }
}
