//! # Playback Session
//!
//! The single logical description of what is playing, shared by every page
//! of the application through the key-value store.
//!
//! Only [`PlayerCore`](crate::PlayerCore) creates a [`SessionHandle`]; the
//! engine adapter and the advance coordinator receive clones of it. Every
//! mutation goes through [`SessionHandle::update`], which refreshes the
//! timestamp and never lets it move backwards.

use bridge_traits::Clock;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_volume() -> f64 {
    1.0
}

fn default_paused() -> bool {
    true
}

fn default_playback_rate() -> f64 {
    1.0
}

/// Persisted session record (`globalPlayerState`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSession {
    pub book_id: String,
    /// Content provider id; older records call it `interface`.
    #[serde(alias = "interface")]
    pub interface_id: String,
    pub chapter_id: String,
    #[serde(default)]
    pub book_title: String,
    #[serde(default)]
    pub chapter_title: String,
    #[serde(default)]
    pub book_image: Option<String>,
    /// Last resolved playable URL
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Seconds
    #[serde(default)]
    pub current_time: f64,
    /// Seconds; `None` until the engine knows it
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub muted: bool,
    #[serde(default = "default_paused")]
    pub paused: bool,
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,
    /// Last write, Unix milliseconds
    #[serde(default)]
    pub timestamp: i64,
}

impl PlaybackSession {
    pub fn new(identity: TrackIdentity, timestamp: i64) -> Self {
        Self {
            book_id: identity.book_id,
            interface_id: identity.interface_id,
            chapter_id: identity.chapter_id,
            book_title: identity.book_title,
            chapter_title: identity.chapter_title,
            book_image: identity.book_image,
            audio_url: None,
            current_time: 0.0,
            duration: None,
            volume: default_volume(),
            muted: false,
            paused: true,
            playback_rate: default_playback_rate(),
            timestamp,
        }
    }

    pub fn identity(&self) -> TrackIdentity {
        TrackIdentity {
            book_id: self.book_id.clone(),
            interface_id: self.interface_id.clone(),
            chapter_id: self.chapter_id.clone(),
            book_title: self.book_title.clone(),
            chapter_title: self.chapter_title.clone(),
            book_image: self.book_image.clone(),
        }
    }

    /// Switch to another chapter. Position and URL belong to the old chapter
    /// and are dropped; volume, mute and rate carry over.
    pub fn set_track(&mut self, identity: TrackIdentity) {
        let same_chapter =
            self.book_id == identity.book_id && self.chapter_id == identity.chapter_id;

        self.book_id = identity.book_id;
        self.interface_id = identity.interface_id;
        self.chapter_id = identity.chapter_id;
        self.book_title = identity.book_title;
        self.chapter_title = identity.chapter_title;
        self.book_image = identity.book_image;

        if !same_chapter {
            self.current_time = 0.0;
            self.duration = None;
            self.audio_url = None;
        }
    }

    /// Age in milliseconds relative to `now_ms`; records from the future count as fresh.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp).max(0)
    }

    /// Route of the dedicated player page for this chapter.
    pub fn player_route(&self) -> String {
        self.identity().player_route()
    }
}

/// Identity and display fields of a chapter. Survives the TTL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackIdentity {
    pub book_id: String,
    #[serde(alias = "interface")]
    pub interface_id: String,
    pub chapter_id: String,
    #[serde(default)]
    pub book_title: String,
    #[serde(default)]
    pub chapter_title: String,
    #[serde(default)]
    pub book_image: Option<String>,
}

impl TrackIdentity {
    pub fn new(
        book_id: impl Into<String>,
        interface_id: impl Into<String>,
        chapter_id: impl Into<String>,
    ) -> Self {
        Self {
            book_id: book_id.into(),
            interface_id: interface_id.into(),
            chapter_id: chapter_id.into(),
            ..Default::default()
        }
    }

    pub fn with_titles(mut self, book_title: impl Into<String>, chapter_title: impl Into<String>) -> Self {
        self.book_title = book_title.into();
        self.chapter_title = chapter_title.into();
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.book_image = Some(url.into());
        self
    }

    /// Same book, another chapter.
    pub fn sibling(&self, chapter_id: impl Into<String>, chapter_title: impl Into<String>) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            chapter_title: chapter_title.into(),
            ..self.clone()
        }
    }

    pub fn player_route(&self) -> String {
        format!(
            "/player/{}/{}/{}",
            self.book_id, self.interface_id, self.chapter_id
        )
    }
}

#[derive(Default)]
struct Slot {
    session: Option<PlaybackSession>,
    /// Bumped whenever the session is replaced, re-pointed or cleared.
    generation: u64,
}

/// Shared handle to the one in-memory session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Slot>>,
    clock: Arc<dyn Clock>,
}

impl SessionHandle {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Slot::default())),
            clock,
        }
    }

    pub fn snapshot(&self) -> Option<PlaybackSession> {
        self.inner.lock().session.clone()
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    pub fn identity(&self) -> Option<TrackIdentity> {
        self.inner.lock().session.as_ref().map(PlaybackSession::identity)
    }

    /// Changes on every `begin`, `install` and `clear`, never on `update`.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Install a restored record as-is, keeping its timestamp.
    pub(crate) fn install(&self, session: PlaybackSession) {
        let mut slot = self.inner.lock();
        slot.session = Some(session);
        slot.generation += 1;
    }

    /// Mutate the active session. Returns `None` when there is none.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut PlaybackSession) -> R) -> Option<R> {
        let now = self.clock.now_millis();
        let mut slot = self.inner.lock();
        let session = slot.session.as_mut()?;
        let result = f(session);
        session.timestamp = session.timestamp.max(now);
        Some(result)
    }

    /// Point the session at `identity`, creating it on first use.
    pub(crate) fn begin(&self, identity: TrackIdentity) -> PlaybackSession {
        let mut slot = self.inner.lock();
        self.begin_locked(&mut slot, identity)
    }

    /// Like [`begin`](Self::begin), but only while the generation is still
    /// `expected`. Returns the new generation.
    pub(crate) fn begin_if_current(&self, expected: u64, identity: TrackIdentity) -> Option<u64> {
        let mut slot = self.inner.lock();
        if slot.generation != expected || slot.session.is_none() {
            return None;
        }
        self.begin_locked(&mut slot, identity);
        Some(slot.generation)
    }

    fn begin_locked(&self, slot: &mut Slot, identity: TrackIdentity) -> PlaybackSession {
        let now = self.clock.now_millis();
        slot.generation += 1;
        let session = slot
            .session
            .get_or_insert_with(|| PlaybackSession::new(identity.clone(), now));
        session.set_track(identity);
        session.timestamp = session.timestamp.max(now);
        session.clone()
    }

    pub(crate) fn clear(&self) {
        let mut slot = self.inner.lock();
        slot.session = None;
        slot.generation += 1;
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.inner.lock();
        f.debug_struct("SessionHandle")
            .field("session", &slot.session)
            .field("generation", &slot.generation)
            .finish()
    }
}
