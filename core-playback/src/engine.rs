//! # Playback Engine Adapter
//!
//! Owns the single host [`MediaEngine`] and keeps the shared session in step
//! with it.
//!
//! ## Load lifecycle
//!
//! ```text
//! Idle ─> Requested ─> Loading ─> Ready ─> Playing <─> Paused
//!                         │         │        │
//!                         └─────────┴────────┴──> Error(kind)
//! ```
//!
//! Each load bumps an attempt counter. Every continuation after an `.await`
//! checks the counter first, so a superseded load never writes state.
//!
//! ## Error policy
//!
//! Engine failures are classified into an [`ErrorKind`] where they arrive:
//! - `AbortedByUser` is logged at debug and dropped.
//! - An error whose failing URL is not the current source is stale and dropped.
//! - `NetworkError` / `DecodeError` re-resolve the URL and reload once.
//! - Everything else, and a second failure, surfaces a notice and leaves
//!   playback paused.

use bridge_traits::{MediaEngine, MediaError, MediaEvent, NoticeSeverity, Notifier};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, SessionEvent};
use core_runtime::logging::redact_url;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::PlayerSettings;
use crate::error::{ErrorKind, PlaybackError, Result};
use crate::now_playing::NowPlayingPublisher;
use crate::readiness::{ReadinessAggregator, ReadinessOutcome};
use crate::resolve::UrlResolver;
use crate::session::{PlaybackSession, SessionHandle, TrackIdentity};
use crate::session_store::SessionStore;

/// Phase of the current load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Requested,
    Loading,
    Ready,
    Playing,
    Paused,
    Error(ErrorKind),
}

/// Result of a play request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// New source loaded and playing
    Playing,
    /// Same source already loaded; engine resumed
    Resumed,
    /// Source loaded and positioned without playing (restore)
    Primed,
    /// Autoplay policy refused `play()`; left paused
    Blocked,
    /// A newer load replaced this one
    Superseded,
}

/// What the caller should do after [`PlaybackEngineAdapter::handle_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Handled,
    Ignored,
    /// The chapter finished; route to the advance coordinator
    ChapterEnded,
}

#[derive(Debug, Clone)]
struct LoadedTrack {
    identity: TrackIdentity,
    url: String,
}

#[derive(Debug)]
struct LoadState {
    phase: LoadPhase,
    loaded: Option<LoadedTrack>,
    /// The single network/decode retry has been spent for this track
    retry_used: bool,
    attempt: u64,
    retry_token: Option<CancellationToken>,
}

impl Default for LoadState {
    fn default() -> Self {
        Self {
            phase: LoadPhase::Idle,
            loaded: None,
            retry_used: false,
            attempt: 0,
            retry_token: None,
        }
    }
}

/// Shared collaborators handed to the adapter by [`PlayerCore`](crate::PlayerCore).
pub(crate) struct AdapterParts {
    pub engine: Arc<dyn MediaEngine>,
    pub session: SessionHandle,
    pub store: Arc<SessionStore>,
    pub publisher: NowPlayingPublisher,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub resolver: UrlResolver,
    pub events: EventBus,
    pub settings: PlayerSettings,
}

pub struct PlaybackEngineAdapter {
    engine: Arc<dyn MediaEngine>,
    session: SessionHandle,
    store: Arc<SessionStore>,
    readiness: ReadinessAggregator,
    publisher: NowPlayingPublisher,
    notifier: Option<Arc<dyn Notifier>>,
    resolver: UrlResolver,
    events: EventBus,
    settings: PlayerSettings,
    state: Mutex<LoadState>,
}

impl PlaybackEngineAdapter {
    pub(crate) fn new(parts: AdapterParts) -> Self {
        let readiness = ReadinessAggregator::new(parts.engine.clone(), &parts.settings);
        Self {
            engine: parts.engine,
            session: parts.session,
            store: parts.store,
            readiness,
            publisher: parts.publisher,
            notifier: parts.notifier,
            resolver: parts.resolver,
            events: parts.events,
            settings: parts.settings,
            state: Mutex::new(LoadState::default()),
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.lock().phase
    }

    /// Chapter id and URL of the loaded source.
    pub fn loaded(&self) -> Option<(String, String)> {
        self.state
            .lock()
            .loaded
            .as_ref()
            .map(|l| (l.identity.chapter_id.clone(), l.url.clone()))
    }

    pub fn engine(&self) -> &Arc<dyn MediaEngine> {
        &self.engine
    }

    pub(crate) fn publisher(&self) -> &NowPlayingPublisher {
        &self.publisher
    }

    // ------------------------------------------------------------------
    // Play / load
    // ------------------------------------------------------------------

    /// Play `identity` from `url`, resuming when that exact source is loaded.
    #[instrument(skip(self, identity, url), fields(chapter_id = %identity.chapter_id))]
    pub async fn play(self: &Arc<Self>, identity: TrackIdentity, url: &str) -> Result<PlayOutcome> {
        if self.can_resume(&identity, url) {
            debug!("Source already loaded; resuming");
            return self.resume(&identity.chapter_id).await;
        }
        self.load_and_play(identity, url, false).await
    }

    fn can_resume(&self, identity: &TrackIdentity, url: &str) -> bool {
        let state = self.state.lock();
        let same_track = state.loaded.as_ref().is_some_and(|l| {
            l.identity.book_id == identity.book_id
                && l.identity.chapter_id == identity.chapter_id
                && l.url == url
        });
        let live = !matches!(state.phase, LoadPhase::Idle | LoadPhase::Error(_));
        drop(state);

        same_track && live && self.engine.source().as_deref() == Some(url)
    }

    async fn resume(self: &Arc<Self>, chapter_id: &str) -> Result<PlayOutcome> {
        let attempt = self.state.lock().attempt;
        match self.engine.play().await {
            Ok(()) => {
                if !self.is_current(attempt) {
                    return Ok(PlayOutcome::Superseded);
                }
                self.set_phase(attempt, LoadPhase::Playing);
                self.session.update(|s| s.paused = false);
                self.store.save_latest(&self.session).await;
                self.publisher.publish_status(false);
                self.emit(CoreEvent::Playback(PlaybackEvent::Resumed {
                    chapter_id: chapter_id.to_string(),
                }));
                Ok(PlayOutcome::Resumed)
            }
            Err(e) => self.handle_play_rejection(attempt, e).await,
        }
    }

    /// Replace the engine source with `url` and start playback once ready.
    ///
    /// When the session already points at the same chapter, its last position
    /// is re-applied if it lies within the new duration.
    pub(crate) async fn load_and_play(
        self: &Arc<Self>,
        identity: TrackIdentity,
        url: &str,
        is_retry: bool,
    ) -> Result<PlayOutcome> {
        let resume_at = self
            .session
            .snapshot()
            .filter(|s| s.book_id == identity.book_id && s.chapter_id == identity.chapter_id)
            .map(|s| s.current_time)
            .filter(|t| t.is_finite() && *t > 0.0);

        self.session.begin(identity.clone());
        self.session.update(|s| s.audio_url = Some(url.to_string()));

        let attempt = self.begin_attempt(&identity, url, is_retry);

        self.engine.pause();
        self.engine.set_source(url);
        self.engine.load();
        let watch = self.readiness.register();
        self.set_phase(attempt, LoadPhase::Loading);

        info!(
            chapter_id = %identity.chapter_id,
            url = %redact_url(url),
            is_retry,
            "Loading chapter audio"
        );
        self.emit(CoreEvent::Playback(PlaybackEvent::LoadStarted {
            chapter_id: identity.chapter_id.clone(),
        }));
        self.publisher.publish_metadata(&identity);
        self.store.save_latest(&self.session).await;

        let outcome = watch.wait().await;
        if !self.is_current(attempt) {
            return Ok(PlayOutcome::Superseded);
        }

        match outcome {
            ReadinessOutcome::Superseded => Ok(PlayOutcome::Superseded),
            ReadinessOutcome::TimedOut => {
                self.fail_load_timeout(attempt, &identity.chapter_id).await;
                Err(PlaybackError::LoadTimeout(self.settings.readiness_timeout()))
            }
            ReadinessOutcome::Ready(via) => {
                self.set_phase(attempt, LoadPhase::Ready);
                self.emit(CoreEvent::Playback(PlaybackEvent::Ready {
                    chapter_id: identity.chapter_id.clone(),
                    via: via.as_str().to_string(),
                }));

                let duration = self.known_duration();
                self.session.update(|s| s.duration = duration);
                if let (Some(at), Some(duration)) = (resume_at, duration) {
                    if at < duration {
                        debug!(position = at, "Re-applying saved position");
                        self.engine.seek(at);
                        self.session.update(|s| s.current_time = at);
                    }
                }

                self.start_playback(attempt, &identity.chapter_id).await
            }
        }
    }

    fn begin_attempt(&self, identity: &TrackIdentity, url: &str, is_retry: bool) -> u64 {
        let mut state = self.state.lock();
        state.attempt += 1;
        if !is_retry {
            state.retry_used = false;
            if let Some(token) = state.retry_token.take() {
                token.cancel();
            }
        }
        state.phase = LoadPhase::Requested;
        state.loaded = Some(LoadedTrack {
            identity: identity.clone(),
            url: url.to_string(),
        });
        state.attempt
    }

    async fn start_playback(self: &Arc<Self>, attempt: u64, chapter_id: &str) -> Result<PlayOutcome> {
        match self.engine.play().await {
            Ok(()) => {
                if !self.is_current(attempt) {
                    return Ok(PlayOutcome::Superseded);
                }
                self.set_phase(attempt, LoadPhase::Playing);
                let position = self.engine.current_time();
                self.session.update(|s| {
                    s.paused = false;
                    s.current_time = position;
                });
                self.store.save_latest(&self.session).await;
                self.publisher.publish_status(false);
                self.publish_position();
                self.emit(CoreEvent::Playback(PlaybackEvent::Started {
                    chapter_id: chapter_id.to_string(),
                }));
                Ok(PlayOutcome::Playing)
            }
            Err(e) => self.handle_play_rejection(attempt, e).await,
        }
    }

    async fn handle_play_rejection(&self, attempt: u64, error: MediaError) -> Result<PlayOutcome> {
        let kind = ErrorKind::from(error.code);
        match kind {
            ErrorKind::AbortedByUser => {
                debug!(error = %error, "play() aborted by a newer load");
                Ok(PlayOutcome::Superseded)
            }
            ErrorKind::NotAllowed => {
                if !self.is_current(attempt) {
                    return Ok(PlayOutcome::Superseded);
                }
                info!("Autoplay blocked; waiting for a user gesture");
                self.set_phase(attempt, LoadPhase::Paused);
                self.session.update(|s| s.paused = true);
                self.store.save_latest(&self.session).await;
                self.publisher.publish_status(true);
                self.notify_kind(kind);
                Ok(PlayOutcome::Blocked)
            }
            _ => {
                warn!(error = %error, kind = %kind, "play() rejected");
                self.set_phase(attempt, LoadPhase::Error(kind));
                Err(PlaybackError::Engine {
                    kind,
                    message: error.to_string(),
                })
            }
        }
    }

    async fn fail_load_timeout(&self, attempt: u64, chapter_id: &str) {
        warn!(
            chapter_id,
            timeout_ms = self.settings.readiness_timeout_ms,
            "Chapter audio did not become ready"
        );
        self.set_phase(attempt, LoadPhase::Error(ErrorKind::LoadTimeout));
        self.session.update(|s| s.paused = true);
        self.store.save_latest(&self.session).await;
        self.publisher.publish_status(true);
        self.notify_kind(ErrorKind::LoadTimeout);
        self.emit(CoreEvent::Playback(PlaybackEvent::LoadTimedOut {
            chapter_id: chapter_id.to_string(),
        }));
    }

    /// Resume whatever the session points at, resolving a URL when needed.
    pub async fn play_current(self: &Arc<Self>) -> Result<PlayOutcome> {
        let loaded = self.state.lock().loaded.clone();
        if let Some(loaded) = loaded {
            return self.play(loaded.identity, &loaded.url).await;
        }

        let session = self.session.snapshot().ok_or(PlaybackError::NoActiveSession)?;
        let identity = session.identity();
        let url = match session.audio_url {
            Some(url) => url,
            None => self.resolver.resolve_for_playback(&identity).await?,
        };
        self.play(identity, &url).await
    }

    /// Backend lookup that skips the caches; the cached URL may be the one that failed.
    async fn fetch_fresh_url(&self, identity: &TrackIdentity) -> Result<String> {
        self.resolver
            .fetch(identity)
            .await
            .map_err(|source| PlaybackError::Resolution {
                chapter_id: identity.chapter_id.clone(),
                source,
            })
    }

    // ------------------------------------------------------------------
    // Transport controls
    // ------------------------------------------------------------------

    pub async fn pause(&self) {
        self.engine.pause();
        let chapter_id = {
            let mut state = self.state.lock();
            if state.phase == LoadPhase::Playing {
                state.phase = LoadPhase::Paused;
            }
            state.loaded.as_ref().map(|l| l.identity.chapter_id.clone())
        };

        let position = self.engine.current_time();
        self.session.update(|s| {
            s.paused = true;
            s.current_time = position;
        });
        self.store.save_latest(&self.session).await;
        self.publisher.publish_status(true);

        if let Some(chapter_id) = chapter_id {
            self.emit(CoreEvent::Playback(PlaybackEvent::Paused {
                chapter_id,
                position_ms: seconds_to_ms(position),
            }));
        }
    }

    /// Play when paused, pause when playing. Returns `None` after pausing.
    pub async fn toggle(self: &Arc<Self>) -> Result<Option<PlayOutcome>> {
        if self.engine.is_paused() {
            self.play_current().await.map(Some)
        } else {
            self.pause().await;
            Ok(None)
        }
    }

    /// Seek to `seconds`, clamped to `[0, duration]`.
    pub async fn seek(&self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() {
            return Err(PlaybackError::InvalidSeek(seconds));
        }
        let upper = self.known_duration().unwrap_or(f64::INFINITY);
        let target = seconds.clamp(0.0, upper);

        self.engine.seek(target);
        self.session.update(|s| s.current_time = target);
        self.store.save_latest(&self.session).await;
        self.publish_position();
        Ok(())
    }

    pub async fn seek_by(&self, delta: f64) -> Result<()> {
        if !delta.is_finite() {
            return Err(PlaybackError::InvalidSeek(delta));
        }
        self.seek(self.engine.current_time() + delta).await
    }

    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }
        self.engine.set_volume(volume);
        self.session.update(|s| s.volume = volume);
        self.store.save_latest(&self.session).await;
        Ok(())
    }

    pub async fn set_muted(&self, muted: bool) {
        self.engine.set_muted(muted);
        self.session.update(|s| s.muted = muted);
        self.store.save_latest(&self.session).await;
    }

    pub async fn set_playback_rate(&self, rate: f64) -> Result<()> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(PlaybackError::InvalidPlaybackRate(rate));
        }
        self.engine.set_playback_rate(rate);
        self.session.update(|s| s.playback_rate = rate);
        self.store.save_latest(&self.session).await;
        self.publish_position();
        Ok(())
    }

    /// Explicit stop: forget the track and remove the stored session.
    pub async fn stop(&self) {
        self.readiness.cancel();
        {
            let mut state = self.state.lock();
            if let Some(token) = state.retry_token.take() {
                token.cancel();
            }
            state.attempt += 1;
            state.phase = LoadPhase::Idle;
            state.loaded = None;
            state.retry_used = false;
        }

        self.engine.pause();
        self.engine.seek(0.0);
        self.session.clear();
        self.store.clear().await;
        self.publisher.clear();

        info!("Playback stopped");
        self.emit(CoreEvent::Playback(PlaybackEvent::Stopped));
        self.emit(CoreEvent::Session(SessionEvent::Cleared));
    }

    /// Persist the session with the engine's current position (page hide).
    pub async fn flush(&self) {
        self.sync_from_engine().await;
    }

    // ------------------------------------------------------------------
    // Restore
    // ------------------------------------------------------------------

    /// Apply a restored session to the engine.
    ///
    /// Engine settings are applied immediately. Loading the source runs on a
    /// spawned task because readiness depends on engine events the host
    /// delivers through [`handle_event`](Self::handle_event).
    pub(crate) fn restore(
        self: &Arc<Self>,
        session: PlaybackSession,
        resume: bool,
    ) -> Option<JoinHandle<Result<PlayOutcome>>> {
        let identity = session.identity();
        self.session.install(session.clone());

        self.engine.set_volume(session.volume.clamp(0.0, 1.0));
        self.engine.set_muted(session.muted);
        if session.playback_rate.is_finite() && session.playback_rate > 0.0 {
            self.engine.set_playback_rate(session.playback_rate);
        }
        self.publisher.publish_metadata(&identity);
        self.publisher.publish_status(true);

        let should_play = resume && !session.paused;
        match (session.audio_url, should_play) {
            (Some(url), true) => {
                let this = Arc::clone(self);
                Some(tokio::spawn(async move {
                    this.load_and_play(identity, &url, false).await
                }))
            }
            (Some(url), false) => {
                let this = Arc::clone(self);
                let position = session.current_time;
                Some(tokio::spawn(async move { this.prime(identity, &url, position).await }))
            }
            (None, true) => {
                let this = Arc::clone(self);
                Some(tokio::spawn(async move {
                    let url = this.resolver.resolve_for_playback(&identity).await?;
                    this.load_and_play(identity, &url, false).await
                }))
            }
            (None, false) => {
                debug!(chapter_id = %identity.chapter_id, "Restored session without audio URL");
                None
            }
        }
    }

    /// Load `url` without playing, then seek to `position`.
    async fn prime(self: &Arc<Self>, identity: TrackIdentity, url: &str, position: f64) -> Result<PlayOutcome> {
        let attempt = self.begin_attempt(&identity, url, false);
        self.engine.set_source(url);
        self.engine.load();
        let watch = self.readiness.register();
        self.set_phase(attempt, LoadPhase::Loading);
        debug!(chapter_id = %identity.chapter_id, url = %redact_url(url), "Priming restored source");

        let outcome = watch.wait().await;
        if !self.is_current(attempt) {
            return Ok(PlayOutcome::Superseded);
        }

        match outcome {
            ReadinessOutcome::Superseded => Ok(PlayOutcome::Superseded),
            ReadinessOutcome::TimedOut => {
                warn!(chapter_id = %identity.chapter_id, "Restored source did not become ready");
                self.set_phase(attempt, LoadPhase::Error(ErrorKind::LoadTimeout));
                Err(PlaybackError::LoadTimeout(self.settings.readiness_timeout()))
            }
            ReadinessOutcome::Ready(_) => {
                self.set_phase(attempt, LoadPhase::Ready);
                let duration = self.known_duration();
                let position = match duration {
                    Some(d) if position.is_finite() && position > 0.0 && position < d => position,
                    _ => 0.0,
                };
                if position > 0.0 {
                    self.engine.seek(position);
                }
                self.session.update(|s| {
                    s.duration = duration;
                    s.current_time = position;
                });
                self.store.save_latest(&self.session).await;
                self.publish_position();
                Ok(PlayOutcome::Primed)
            }
        }
    }

    // ------------------------------------------------------------------
    // Engine events
    // ------------------------------------------------------------------

    /// Route one engine event.
    pub async fn handle_event(self: &Arc<Self>, event: &MediaEvent) -> EventDisposition {
        self.readiness.notify(event);

        match event {
            MediaEvent::CanPlay | MediaEvent::CanPlayThrough => EventDisposition::Handled,
            MediaEvent::Play => {
                self.transition_phase(LoadPhase::Paused, LoadPhase::Playing);
                self.publisher.publish_status(false);
                self.sync_from_engine().await
            }
            MediaEvent::Pause => {
                self.transition_phase(LoadPhase::Playing, LoadPhase::Paused);
                self.publisher.publish_status(true);
                self.sync_from_engine().await
            }
            MediaEvent::LoadedMetadata
            | MediaEvent::TimeUpdate
            | MediaEvent::VolumeChange
            | MediaEvent::RateChange => self.sync_from_engine().await,
            MediaEvent::Ended => {
                if !self.session.is_active() {
                    return EventDisposition::Ignored;
                }
                self.transition_phase(LoadPhase::Playing, LoadPhase::Paused);
                self.sync_from_engine().await;
                self.publisher.publish_status(true);
                EventDisposition::ChapterEnded
            }
            MediaEvent::Error(error) => {
                self.handle_engine_error(error.clone()).await;
                EventDisposition::Handled
            }
        }
    }

    async fn sync_from_engine(&self) -> EventDisposition {
        let positional = matches!(
            self.phase(),
            LoadPhase::Ready | LoadPhase::Playing | LoadPhase::Paused
        );
        let engine = &self.engine;
        let duration = self.known_duration();

        let synced = self.session.update(|s| {
            s.volume = engine.volume();
            s.muted = engine.is_muted();
            s.playback_rate = engine.playback_rate();
            if positional {
                s.current_time = engine.current_time();
                s.duration = duration;
                s.paused = engine.is_paused();
            }
        });
        if synced.is_none() {
            return EventDisposition::Ignored;
        }

        self.store.save_latest(&self.session).await;
        if positional {
            self.publish_position();
        }
        EventDisposition::Handled
    }

    async fn handle_engine_error(self: &Arc<Self>, error: MediaError) {
        let kind = ErrorKind::from(error.code);
        if kind.is_benign() {
            debug!(error = %error, "Ignoring aborted load");
            return;
        }

        let retry = {
            let mut state = self.state.lock();
            let Some(loaded) = state.loaded.clone() else {
                debug!(error = %error, "Engine error with no loaded track");
                return;
            };
            if let Some(failed) = error.source_url.as_deref() {
                if failed != loaded.url {
                    debug!(failed = %redact_url(failed), "Ignoring error from a previous source");
                    return;
                }
            }

            if kind.is_retryable() && !state.retry_used {
                state.retry_used = true;
                let token = CancellationToken::new();
                state.retry_token = Some(token.clone());
                Ok((loaded, state.attempt, token))
            } else {
                state.phase = LoadPhase::Error(kind);
                Err(loaded)
            }
        };

        match retry {
            Ok((loaded, attempt, token)) => {
                let delay = self.settings.retry_delay();
                info!(
                    chapter_id = %loaded.identity.chapter_id,
                    kind = %kind,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling playback retry with a fresh URL"
                );
                self.emit(CoreEvent::Playback(PlaybackEvent::RetryScheduled {
                    chapter_id: loaded.identity.chapter_id.clone(),
                    delay_ms: delay.as_millis() as u64,
                }));

                let this = Arc::clone(self);
                tokio::spawn(async move {
                    this.retry(loaded.identity, kind, attempt, token).await;
                });
            }
            Err(loaded) => {
                warn!(chapter_id = %loaded.identity.chapter_id, kind = %kind, error = %error, "Playback failed");
                self.surface_failure(&loaded.identity.chapter_id, kind, error.to_string())
                    .await;
            }
        }
    }

    async fn retry(self: Arc<Self>, identity: TrackIdentity, kind: ErrorKind, attempt: u64, token: CancellationToken) {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(self.settings.retry_delay()) => {}
        }
        if !self.is_current(attempt) {
            debug!("Retry skipped: a newer load started");
            return;
        }

        let url = match self.fetch_fresh_url(&identity).await {
            Ok(url) => url,
            Err(e) => {
                if self.is_current(attempt) {
                    warn!(chapter_id = %identity.chapter_id, error = %e, "Retry could not resolve a fresh URL");
                    self.set_phase(attempt, LoadPhase::Error(kind));
                    self.surface_failure(&identity.chapter_id, kind, e.to_string()).await;
                }
                return;
            }
        };
        if token.is_cancelled() || !self.is_current(attempt) {
            return;
        }

        if let Err(e) = self.load_and_play(identity, &url, true).await {
            debug!(error = %e, "Retry load failed");
        }
    }

    async fn surface_failure(&self, chapter_id: &str, kind: ErrorKind, message: String) {
        self.session.update(|s| s.paused = true);
        self.store.save_latest(&self.session).await;
        self.publisher.publish_status(true);
        self.notify_kind(kind);
        self.emit(CoreEvent::Playback(PlaybackEvent::Error {
            chapter_id: Some(chapter_id.to_string()),
            kind: kind.to_string(),
            message,
            recoverable: false,
        }));
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn is_current(&self, attempt: u64) -> bool {
        self.state.lock().attempt == attempt
    }

    fn set_phase(&self, attempt: u64, phase: LoadPhase) {
        let mut state = self.state.lock();
        if state.attempt == attempt {
            state.phase = phase;
        }
    }

    fn transition_phase(&self, from: LoadPhase, to: LoadPhase) {
        let mut state = self.state.lock();
        if state.phase == from || (from == LoadPhase::Paused && state.phase == LoadPhase::Ready) {
            state.phase = to;
        }
    }

    fn known_duration(&self) -> Option<f64> {
        self.engine.duration().filter(|d| d.is_finite() && *d > 0.0)
    }

    fn publish_position(&self) {
        self.publisher.publish_position(
            self.known_duration(),
            self.engine.playback_rate(),
            self.engine.current_time(),
        );
    }

    pub(crate) fn notify_kind(&self, kind: ErrorKind) {
        let (Some(notifier), Some(message)) = (&self.notifier, kind.user_message()) else {
            return;
        };
        let severity = match kind {
            ErrorKind::NotAllowed => NoticeSeverity::Info,
            ErrorKind::LoadTimeout => NoticeSeverity::Warning,
            _ => NoticeSeverity::Error,
        };
        notifier.notify(message, severity);
    }

    fn emit(&self, event: CoreEvent) {
        self.events.emit(event).ok();
    }
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0) as u64
    } else {
        0
    }
}

impl std::fmt::Debug for PlaybackEngineAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngineAdapter")
            .field("state", &*self.state.lock())
            .finish()
    }
}
