//! # PlayerCore
//!
//! Owns and wires every playback component. This is the only place a
//! [`SessionHandle`] is created, so there is exactly one session per core.
//!
//! ## Event routing
//!
//! - Engine events go to the adapter; `ended` is forwarded to the advance
//!   coordinator on a spawned task.
//! - Now-playing actions run on spawned tasks so the host can keep delivering
//!   engine events (which readiness depends on) while an action is pending.

use bridge_traits::{
    ChapterApi, ChapterContext, Clock, KeyValueStore, MediaAction, MediaEngine, MediaEvent,
    Notifier, NowPlaying, PrefetchCache, SingleSlotCache,
};
use core_runtime::config::{CoreConfig, FeatureFlags};
use core_runtime::events::{CoreEvent, EventBus, Receiver, SessionEvent};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::advance::{AdvanceCoordinator, AdvanceOutcome, AdvanceTrigger, CoordinatorParts, PageKind};
use crate::claim::TransitionClaim;
use crate::config::PlayerSettings;
use crate::engine::{AdapterParts, EventDisposition, PlayOutcome, PlaybackEngineAdapter};
use crate::error::{PlaybackError, Result};
use crate::now_playing::NowPlayingPublisher;
use crate::position::PositionStore;
use crate::resolve::UrlResolver;
use crate::session::{PlaybackSession, SessionHandle, TrackIdentity};
use crate::session_store::SessionStore;
use crate::widget::WidgetController;

/// Host capabilities used by the core.
#[derive(Clone)]
pub struct PlayerBridges {
    pub engine: Arc<dyn MediaEngine>,
    pub store: Arc<dyn KeyValueStore>,
    pub chapter_api: Arc<dyn ChapterApi>,
    pub now_playing: Option<Arc<dyn NowPlaying>>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub prefetch: Option<Arc<dyn PrefetchCache>>,
    pub legacy: Option<Arc<dyn SingleSlotCache>>,
    pub clock: Arc<dyn Clock>,
}

impl From<&CoreConfig> for PlayerBridges {
    fn from(config: &CoreConfig) -> Self {
        Self {
            engine: config.media_engine.clone(),
            store: config.key_value_store.clone(),
            chapter_api: config.chapter_api.clone(),
            now_playing: config.now_playing.clone(),
            notifier: config.notifier.clone(),
            prefetch: config.prefetch_cache.clone(),
            legacy: config.legacy_slot.clone(),
            clock: config.clock.clone(),
        }
    }
}

/// A restored session and, when a source was loaded for it, the load task.
#[derive(Debug)]
pub struct Restored {
    pub session: PlaybackSession,
    pub load: Option<JoinHandle<Result<PlayOutcome>>>,
}

pub struct PlayerCore {
    session: SessionHandle,
    store: Arc<SessionStore>,
    adapter: Arc<PlaybackEngineAdapter>,
    coordinator: Arc<AdvanceCoordinator>,
    widget: WidgetController,
    claims: TransitionClaim,
    events: EventBus,
    settings: PlayerSettings,
    features: FeatureFlags,
}

impl PlayerCore {
    pub fn new(
        bridges: PlayerBridges,
        settings: PlayerSettings,
        features: FeatureFlags,
        events: Option<EventBus>,
    ) -> Result<Arc<Self>> {
        settings.validate()?;

        let events = events.unwrap_or_default();
        let session = SessionHandle::new(bridges.clock.clone());
        let store = Arc::new(SessionStore::new(
            bridges.store.clone(),
            bridges.clock.clone(),
            &settings,
        ));
        let resolver = UrlResolver::new(
            bridges.chapter_api.clone(),
            bridges.prefetch.clone(),
            bridges.legacy.clone(),
        );
        let publisher = NowPlayingPublisher::new(bridges.now_playing.clone());
        if features.enable_media_session {
            publisher.register_actions();
        }

        let adapter = Arc::new(PlaybackEngineAdapter::new(AdapterParts {
            engine: bridges.engine.clone(),
            session: session.clone(),
            store: store.clone(),
            publisher,
            notifier: bridges.notifier.clone(),
            resolver: resolver.clone(),
            events: events.clone(),
            settings: settings.clone(),
        }));

        let claims = TransitionClaim::new();
        let coordinator = Arc::new(AdvanceCoordinator::new(CoordinatorParts {
            adapter: adapter.clone(),
            session: session.clone(),
            store: store.clone(),
            resolver,
            claims: claims.clone(),
            events: events.clone(),
            context_cache_size: settings.context_cache_size,
            auto_advance: features.enable_auto_advance,
        }));

        let widget = WidgetController::new(
            PositionStore::new(bridges.store.clone(), &settings),
            session.clone(),
            settings.clone(),
        );

        info!(
            auto_advance = features.enable_auto_advance,
            resume_on_restore = features.resume_on_restore,
            "Player core initialized"
        );

        Ok(Arc::new(Self {
            session,
            store,
            adapter,
            coordinator,
            widget,
            claims,
            events,
            settings,
            features,
        }))
    }

    /// Build from a validated [`CoreConfig`].
    pub fn from_config(config: &CoreConfig, settings: PlayerSettings) -> Result<Arc<Self>> {
        Self::new(PlayerBridges::from(config), settings, config.features, None)
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// Load the persisted session and apply it to the engine.
    pub async fn restore(&self) -> Option<Restored> {
        let session = self.store.restore().await?;

        info!(
            chapter_id = %session.chapter_id,
            url_kept = session.audio_url.is_some(),
            "Restoring playback session"
        );
        self.emit(CoreEvent::Session(SessionEvent::Restored {
            book_id: session.book_id.clone(),
            chapter_id: session.chapter_id.clone(),
            url_kept: session.audio_url.is_some(),
        }));

        let load = self
            .adapter
            .restore(session.clone(), self.features.resume_on_restore);
        Some(Restored { session, load })
    }

    pub fn session(&self) -> Option<PlaybackSession> {
        self.session.snapshot()
    }

    /// Persist the current position (page hide / visibility change).
    pub async fn flush(&self) {
        self.adapter.flush().await;
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Play a chapter. Without a URL one is resolved from the caches or the
    /// network.
    pub async fn play(&self, identity: TrackIdentity, url: Option<String>) -> Result<PlayOutcome> {
        let url = match url {
            Some(url) => url,
            None => self
                .coordinator
                .resolve_url(&identity)
                .await
                .map(|(url, _)| url)
                .map_err(|source| PlaybackError::Resolution {
                    chapter_id: identity.chapter_id.clone(),
                    source,
                })?,
        };
        self.adapter.play(identity, &url).await
    }

    pub async fn pause(&self) {
        self.adapter.pause().await;
    }

    pub async fn toggle(&self) -> Result<Option<PlayOutcome>> {
        self.adapter.toggle().await
    }

    pub async fn seek(&self, seconds: f64) -> Result<()> {
        self.adapter.seek(seconds).await
    }

    pub async fn seek_by(&self, delta: f64) -> Result<()> {
        self.adapter.seek_by(delta).await
    }

    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        self.adapter.set_volume(volume).await
    }

    pub async fn set_muted(&self, muted: bool) {
        self.adapter.set_muted(muted).await;
    }

    pub async fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.adapter.set_playback_rate(rate).await
    }

    pub async fn stop(&self) {
        self.adapter.stop().await;
    }

    // ------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------

    /// Feed one engine event. Returns the advance task when the chapter ended.
    pub async fn handle_event(&self, event: MediaEvent) -> Option<JoinHandle<AdvanceOutcome>> {
        match self.adapter.handle_event(&event).await {
            EventDisposition::ChapterEnded => {
                let coordinator = self.coordinator.clone();
                Some(tokio::spawn(async move {
                    coordinator.request_advance(AdvanceTrigger::EngineEnded).await
                }))
            }
            EventDisposition::Handled | EventDisposition::Ignored => None,
        }
    }

    /// Run a now-playing action on a spawned task.
    pub fn handle_action(&self, action: MediaAction) -> JoinHandle<()> {
        let adapter = self.adapter.clone();
        let coordinator = self.coordinator.clone();
        let step = self.settings.seek_step_secs;
        debug!(?action, "Now-playing action");

        tokio::spawn(async move {
            let result = match action {
                MediaAction::Play => adapter.play_current().await.map(|_| ()),
                MediaAction::Pause => {
                    adapter.pause().await;
                    Ok(())
                }
                MediaAction::SeekTo(position) => adapter.seek(position).await,
                MediaAction::SeekForward(offset) => adapter.seek_by(seek_offset(offset, step)).await,
                MediaAction::SeekBackward(offset) => adapter.seek_by(-seek_offset(offset, step)).await,
                MediaAction::NextTrack => {
                    let outcome = coordinator.request_advance(AdvanceTrigger::MediaSessionNext).await;
                    debug!(?outcome, "Next track handled");
                    Ok(())
                }
                MediaAction::PreviousTrack => {
                    let outcome = coordinator.request_previous().await;
                    debug!(?outcome, "Previous track handled");
                    Ok(())
                }
            };

            if let Err(e) = result {
                warn!(?action, error = %e, "Now-playing action failed");
            }
        })
    }

    pub async fn request_advance(&self, trigger: AdvanceTrigger) -> AdvanceOutcome {
        self.coordinator.request_advance(trigger).await
    }

    pub async fn request_previous(&self) -> AdvanceOutcome {
        self.coordinator.request_previous().await
    }

    /// Claims shared with page-level chapter switching.
    pub fn claims(&self) -> TransitionClaim {
        self.claims.clone()
    }

    pub fn prime_chapter_context(&self, book_id: &str, chapter_id: &str, context: ChapterContext) {
        self.coordinator.prime_chapter_context(book_id, chapter_id, context);
    }

    pub fn set_page_kind(&self, page: PageKind) {
        self.coordinator.set_page_kind(page);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn widget(&self) -> &WidgetController {
        &self.widget
    }

    pub fn adapter(&self) -> &Arc<PlaybackEngineAdapter> {
        &self.adapter
    }

    pub fn coordinator(&self) -> &Arc<AdvanceCoordinator> {
        &self.coordinator
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: CoreEvent) {
        self.events.emit(event).ok();
    }
}

fn seek_offset(offset: f64, default_step: f64) -> f64 {
    if offset.is_finite() && offset > 0.0 {
        offset
    } else {
        default_step
    }
}

impl std::fmt::Debug for PlayerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerCore")
            .field("session", &self.session)
            .field("adapter", &self.adapter)
            .field("coordinator", &self.coordinator)
            .field("features", &self.features)
            .finish()
    }
}
