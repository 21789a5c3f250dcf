//! # Chapter Advance Coordinator
//!
//! Moves playback to the neighbouring chapter exactly once per request, no
//! matter how many sources report the end of a chapter at the same time.
//!
//! ## Triggers
//!
//! - [`AdvanceTrigger::EngineEnded`]: the engine finished the chapter. Ignored
//!   while the dedicated player page is active (it runs its own handling) and
//!   when auto-advance is disabled.
//! - [`AdvanceTrigger::MediaSessionNext`]: the OS "next track" control.
//! - [`AdvanceTrigger::PageHelper`]: a page-level chapter switch, optionally
//!   carrying an already resolved URL.
//!
//! ## Pipeline
//!
//! ```text
//! Idle ──Begin──> Resolving ──HandOff──> HandingOff ──Finish──> Idle
//!                     │                                   ▲
//!                     └──────────── Finish ───────────────┘
//! ```
//!
//! 1. Chapter context: in-memory cache, else the network.
//! 2. Transition claim check.
//! 3. Playable URL: prefetch cache, then the legacy slot, then the network.
//! 4. Claim check again, then hand off to the engine adapter.
//!
//! A request that arrives while another is in flight returns
//! [`AdvanceOutcome::AlreadyInFlight`] without side effects.
//!
//! An explicit stop or a user-initiated load while a request is resolving
//! changes the session generation; the request then returns
//! [`AdvanceOutcome::Superseded`] and writes nothing.

use bridge_traits::{BridgeError, ChapterContext};
use core_runtime::events::{ChapterEvent, CoreEvent, EventBus, SessionEvent};
use core_runtime::logging::redact_url;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::claim::TransitionClaim;
use crate::engine::PlaybackEngineAdapter;
use crate::error::ErrorKind;
use crate::resolve::UrlResolver;
use crate::session::{SessionHandle, TrackIdentity};
use crate::session_store::SessionStore;

pub use crate::resolve::UrlSource;

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AdvanceState {
    #[default]
    Idle,
    Resolving {
        from: String,
    },
    HandingOff {
        from: String,
        to: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceStep {
    Begin { from: String },
    HandOff { to: String },
    Finish,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid advance transition: {step} from {state}")]
pub struct InvalidTransition {
    pub state: &'static str,
    pub step: &'static str,
}

impl AdvanceState {
    pub fn name(&self) -> &'static str {
        match self {
            AdvanceState::Idle => "Idle",
            AdvanceState::Resolving { .. } => "Resolving",
            AdvanceState::HandingOff { .. } => "HandingOff",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, AdvanceState::Idle)
    }

    /// Checked transition.
    pub fn apply(&self, step: AdvanceStep) -> Result<AdvanceState, InvalidTransition> {
        match (self, step) {
            (AdvanceState::Idle, AdvanceStep::Begin { from }) => Ok(AdvanceState::Resolving { from }),
            (AdvanceState::Resolving { from }, AdvanceStep::HandOff { to }) => Ok(AdvanceState::HandingOff {
                from: from.clone(),
                to,
            }),
            (AdvanceState::Resolving { .. } | AdvanceState::HandingOff { .. }, AdvanceStep::Finish) => {
                Ok(AdvanceState::Idle)
            }
            (state, step) => Err(InvalidTransition {
                state: state.name(),
                step: match step {
                    AdvanceStep::Begin { .. } => "Begin",
                    AdvanceStep::HandOff { .. } => "HandOff",
                    AdvanceStep::Finish => "Finish",
                },
            }),
        }
    }
}

/// Holds the coordinator out of `Idle` and returns it there on drop.
struct InFlightGuard {
    state: Arc<Mutex<AdvanceState>>,
}

impl InFlightGuard {
    fn begin(state: &Arc<Mutex<AdvanceState>>, from: &str) -> Option<Self> {
        let mut current = state.lock();
        let next = current
            .apply(AdvanceStep::Begin {
                from: from.to_string(),
            })
            .ok()?;
        *current = next;
        Some(Self {
            state: Arc::clone(state),
        })
    }

    fn hand_off(&self, to: &str) -> Result<(), InvalidTransition> {
        let mut current = self.state.lock();
        *current = current.apply(AdvanceStep::HandOff { to: to.to_string() })?;
        Ok(())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut current = self.state.lock();
        *current = current.apply(AdvanceStep::Finish).unwrap_or_default();
    }
}

// ============================================================================
// Requests and outcomes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceTrigger {
    EngineEnded,
    MediaSessionNext,
    PageHelper { pre_resolved: Option<String> },
}

impl AdvanceTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvanceTrigger::EngineEnded => "engine-ended",
            AdvanceTrigger::MediaSessionNext => "media-session-next",
            AdvanceTrigger::PageHelper { .. } => "page-helper",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced {
        from: String,
        to: String,
        source: UrlSource,
    },
    AlreadyInFlight,
    /// Another component claimed the transition to this chapter
    ClaimedElsewhere {
        chapter_id: String,
    },
    NoNextChapter,
    NoPreviousChapter,
    NoActiveSession,
    /// The session was stopped or switched by the user mid-request
    Superseded,
    /// Trigger not applicable in the current context
    Ignored,
    Failed(ErrorKind),
}

/// Which page the host is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageKind {
    /// The dedicated player page, which handles `ended` itself
    PlayerPage,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Next,
    Previous,
}

// ============================================================================
// Coordinator
// ============================================================================

pub(crate) struct CoordinatorParts {
    pub adapter: Arc<PlaybackEngineAdapter>,
    pub session: SessionHandle,
    pub store: Arc<SessionStore>,
    pub resolver: UrlResolver,
    pub claims: TransitionClaim,
    pub events: EventBus,
    pub context_cache_size: usize,
    pub auto_advance: bool,
}

pub struct AdvanceCoordinator {
    adapter: Arc<PlaybackEngineAdapter>,
    session: SessionHandle,
    store: Arc<SessionStore>,
    resolver: UrlResolver,
    claims: TransitionClaim,
    events: EventBus,
    contexts: Mutex<LruCache<String, ChapterContext>>,
    state: Arc<Mutex<AdvanceState>>,
    page: Mutex<PageKind>,
    auto_advance: bool,
}

fn context_key(book_id: &str, chapter_id: &str) -> String {
    format!("{book_id}/{chapter_id}")
}

impl AdvanceCoordinator {
    pub(crate) fn new(parts: CoordinatorParts) -> Self {
        let capacity = NonZeroUsize::new(parts.context_cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            adapter: parts.adapter,
            session: parts.session,
            store: parts.store,
            resolver: parts.resolver,
            claims: parts.claims,
            events: parts.events,
            contexts: Mutex::new(LruCache::new(capacity)),
            state: Arc::new(Mutex::new(AdvanceState::Idle)),
            page: Mutex::new(PageKind::default()),
            auto_advance: parts.auto_advance,
        }
    }

    pub fn state(&self) -> AdvanceState {
        self.state.lock().clone()
    }

    pub fn set_page_kind(&self, page: PageKind) {
        *self.page.lock() = page;
    }

    pub fn page_kind(&self) -> PageKind {
        *self.page.lock()
    }

    /// Remember a chapter's neighbours, typically supplied by the page that
    /// already fetched them.
    pub fn prime_chapter_context(&self, book_id: &str, chapter_id: &str, context: ChapterContext) {
        self.contexts.lock().put(context_key(book_id, chapter_id), context);
    }

    #[instrument(skip(self, trigger), fields(trigger = trigger.as_str()))]
    pub async fn request_advance(&self, trigger: AdvanceTrigger) -> AdvanceOutcome {
        if trigger == AdvanceTrigger::EngineEnded {
            if !self.auto_advance {
                debug!("Auto-advance disabled");
                return AdvanceOutcome::Ignored;
            }
            if self.page_kind() == PageKind::PlayerPage {
                debug!("Player page handles chapter end itself");
                return AdvanceOutcome::Ignored;
            }
        }

        let (pre_resolved, own_claim) = match &trigger {
            AdvanceTrigger::PageHelper { pre_resolved } => (pre_resolved.clone(), true),
            _ => (None, false),
        };
        self.run(Direction::Next, trigger.as_str(), pre_resolved, own_claim)
            .await
    }

    /// Same pipeline toward the previous chapter.
    pub async fn request_previous(&self) -> AdvanceOutcome {
        self.run(Direction::Previous, "previous-track", None, false).await
    }

    async fn run(
        &self,
        direction: Direction,
        trigger: &str,
        pre_resolved: Option<String>,
        own_claim: bool,
    ) -> AdvanceOutcome {
        let Some(current) = self.session.identity() else {
            debug!("No active session to advance");
            return AdvanceOutcome::NoActiveSession;
        };

        let generation = self.session.generation();

        let Some(guard) = InFlightGuard::begin(&self.state, &current.chapter_id) else {
            debug!(chapter_id = %current.chapter_id, "Advance already in flight");
            return AdvanceOutcome::AlreadyInFlight;
        };

        self.emit(CoreEvent::Chapter(ChapterEvent::AdvanceStarted {
            from_chapter_id: current.chapter_id.clone(),
            trigger: trigger.to_string(),
        }));

        let context = self.context_for(&current).await;
        if self.superseded(generation) {
            return self.abandon(&current.chapter_id);
        }
        let context = match context {
            Ok(context) => context,
            Err(e) => return self.resolution_failed(&current.chapter_id, e),
        };

        let neighbour = match direction {
            Direction::Next => context.next_chapter,
            Direction::Previous => context.previous_chapter,
        };
        let Some(neighbour) = neighbour else {
            return self.end_of_book(&current, direction).await;
        };
        let target = current.sibling(neighbour.id, neighbour.title);

        if !own_claim && self.claims.consume(&target.chapter_id) {
            return self.claimed_elsewhere(&target.chapter_id);
        }

        let (url, source) = match pre_resolved {
            Some(url) => (url, UrlSource::PreResolved),
            None => {
                let resolved = self.resolver.resolve(&target).await;
                if self.superseded(generation) {
                    return self.abandon(&current.chapter_id);
                }
                match resolved {
                    Ok(resolved) => resolved,
                    Err(e) => return self.resolution_failed(&target.chapter_id, e),
                }
            }
        };

        let claimed = self.claims.consume(&target.chapter_id);
        if claimed && !own_claim {
            return self.claimed_elsewhere(&target.chapter_id);
        }

        if let Err(e) = guard.hand_off(&target.chapter_id) {
            warn!(error = %e, "Advance state out of step");
            return AdvanceOutcome::Failed(ErrorKind::ResolutionFailed);
        }

        info!(
            from = %current.chapter_id,
            to = %target.chapter_id,
            source = source.as_str(),
            url = %redact_url(&url),
            "Handing off to next chapter"
        );

        let Some(handed_off) = self.session.begin_if_current(generation, target.clone()) else {
            return self.abandon(&current.chapter_id);
        };
        self.adapter.publisher().publish_metadata(&target);
        self.store.save_latest(&self.session).await;
        if self.superseded(handed_off) {
            return self.abandon(&target.chapter_id);
        }
        self.emit(CoreEvent::Session(SessionEvent::TrackChanged {
            book_id: target.book_id.clone(),
            chapter_id: target.chapter_id.clone(),
        }));

        if let Err(e) = self.adapter.load_and_play(target.clone(), &url, false).await {
            warn!(chapter_id = %target.chapter_id, error = %e, "Next chapter failed to start");
            return AdvanceOutcome::Failed(e.kind().unwrap_or(ErrorKind::ResolutionFailed));
        }

        self.emit(CoreEvent::Chapter(ChapterEvent::Advanced {
            book_id: target.book_id.clone(),
            from_chapter_id: current.chapter_id.clone(),
            to_chapter_id: target.chapter_id.clone(),
            source: source.as_str().to_string(),
        }));

        AdvanceOutcome::Advanced {
            from: current.chapter_id,
            to: target.chapter_id,
            source,
        }
    }

    async fn context_for(&self, current: &TrackIdentity) -> Result<ChapterContext, BridgeError> {
        let key = context_key(&current.book_id, &current.chapter_id);
        if let Some(context) = self.contexts.lock().get(&key).cloned() {
            debug!(chapter_id = %current.chapter_id, "Chapter context from cache");
            return Ok(context);
        }

        let context = self
            .resolver
            .chapter_api()
            .resolve_chapter_context(&current.book_id, &current.chapter_id, &current.interface_id)
            .await?;
        self.contexts.lock().put(key, context.clone());
        Ok(context)
    }

    /// First hit wins: prefetch cache, legacy slot, network.
    pub(crate) async fn resolve_url(&self, target: &TrackIdentity) -> Result<(String, UrlSource), BridgeError> {
        self.resolver.resolve(target).await
    }

    fn superseded(&self, generation: u64) -> bool {
        self.session.generation() != generation
    }

    fn abandon(&self, chapter_id: &str) -> AdvanceOutcome {
        info!(chapter_id, "Advance abandoned: session stopped or switched");
        AdvanceOutcome::Superseded
    }

    async fn end_of_book(&self, current: &TrackIdentity, direction: Direction) -> AdvanceOutcome {
        info!(chapter_id = %current.chapter_id, ?direction, "No chapter in that direction");

        if direction == Direction::Next {
            self.session.update(|s| s.paused = true);
            self.store.save_latest(&self.session).await;
            self.adapter.publisher().publish_status(true);
            self.emit(CoreEvent::Chapter(ChapterEvent::EndOfBook {
                chapter_id: current.chapter_id.clone(),
            }));
            AdvanceOutcome::NoNextChapter
        } else {
            AdvanceOutcome::NoPreviousChapter
        }
    }

    fn claimed_elsewhere(&self, chapter_id: &str) -> AdvanceOutcome {
        debug!(chapter_id, "Transition claimed by another component");
        self.emit(CoreEvent::Chapter(ChapterEvent::ClaimedElsewhere {
            chapter_id: chapter_id.to_string(),
        }));
        AdvanceOutcome::ClaimedElsewhere {
            chapter_id: chapter_id.to_string(),
        }
    }

    fn resolution_failed(&self, chapter_id: &str, error: BridgeError) -> AdvanceOutcome {
        warn!(chapter_id, error = %error, "Chapter resolution failed");
        self.adapter.notify_kind(ErrorKind::ResolutionFailed);
        self.emit(CoreEvent::Chapter(ChapterEvent::ResolutionFailed {
            chapter_id: chapter_id.to_string(),
            message: error.to_string(),
        }));
        AdvanceOutcome::Failed(ErrorKind::ResolutionFailed)
    }

    fn emit(&self, event: CoreEvent) {
        self.events.emit(event).ok();
    }
}

impl std::fmt::Debug for AdvanceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvanceCoordinator")
            .field("state", &*self.state.lock())
            .field("page", &*self.page.lock())
            .field("auto_advance", &self.auto_advance)
            .finish()
    }
}
