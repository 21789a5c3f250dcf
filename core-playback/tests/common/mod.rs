//! Shared doubles and a wired `PlayerCore` for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, CachedAudioEntry, ChapterApi, ChapterContext, ChapterRef, Clock, KeyValueStore,
    MediaActionKind, MediaEngine, MediaError, MediaErrorCode, NoticeSeverity, Notifier, NowPlaying,
    NowPlayingMetadata, PlaybackStatus, PositionState, PrefetchCache, ReadyState, SingleSlotCache,
};
use chrono::{DateTime, TimeZone, Utc};
use core_playback::{PlayerBridges, PlayerCore, PlayerSettings, TrackIdentity};
use core_runtime::config::FeatureFlags;
use mockall::mock;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const NOW: i64 = 1_700_000_000_000;

mock! {
    pub ChapterApi {}

    #[async_trait]
    impl ChapterApi for ChapterApi {
        async fn resolve_chapter_context(
            &self,
            book_id: &str,
            chapter_id: &str,
            interface_id: &str,
        ) -> BridgeResult<ChapterContext>;

        async fn resolve_playable_url(
            &self,
            book_id: &str,
            chapter_id: &str,
            interface_id: &str,
        ) -> BridgeResult<String>;
    }
}

pub fn chapter(id: &str) -> TrackIdentity {
    TrackIdentity::new("book-1", "iface", id).with_titles("The Book", format!("Chapter {id}"))
}

pub fn context(previous: Option<&str>, next: Option<&str>) -> ChapterContext {
    ChapterContext {
        previous_chapter: previous.map(|id| ChapterRef::new(id, format!("Chapter {id}"))),
        next_chapter: next.map(|id| ChapterRef::new(id, format!("Chapter {id}"))),
    }
}

// ----------------------------------------------------------------------------
// Clock
// ----------------------------------------------------------------------------

pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(millis: i64) -> Self {
        Self(AtomicI64::new(millis))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_millis())
            .single()
            .unwrap_or_default()
    }

    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

// ----------------------------------------------------------------------------
// Storage
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn insert(&self, key: &str, value: &str) {
        self.data.lock().insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.insert(key, value);
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.get(key))
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.data.lock().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.data.lock().keys().cloned().collect())
    }
}

// ----------------------------------------------------------------------------
// Engine
// ----------------------------------------------------------------------------

pub struct FakeEngine {
    source: Mutex<Option<String>>,
    loads: AtomicUsize,
    ready: Mutex<ReadyState>,
    ready_on_load: Mutex<Option<ReadyState>>,
    current_time: Mutex<f64>,
    duration: Mutex<Option<f64>>,
    paused: AtomicBool,
    rejections: Mutex<VecDeque<MediaErrorCode>>,
}

impl FakeEngine {
    /// Engine that reports ready as soon as `load()` is issued.
    pub fn instant() -> Self {
        Self {
            source: Mutex::new(None),
            loads: AtomicUsize::new(0),
            ready: Mutex::new(ReadyState::HaveNothing),
            ready_on_load: Mutex::new(Some(ReadyState::HaveEnoughData)),
            current_time: Mutex::new(0.0),
            duration: Mutex::new(Some(1800.0)),
            paused: AtomicBool::new(true),
            rejections: Mutex::new(VecDeque::new()),
        }
    }

    /// Engine that only becomes ready through delivered events.
    pub fn silent() -> Self {
        let engine = Self::instant();
        *engine.ready_on_load.lock() = None;
        engine
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn reject_next_play(&self, code: MediaErrorCode) {
        self.rejections.lock().push_back(code);
    }

    pub fn set_current_time(&self, seconds: f64) {
        *self.current_time.lock() = seconds;
    }

    pub fn current_source(&self) -> Option<String> {
        self.source.lock().clone()
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    fn set_source(&self, url: &str) {
        *self.source.lock() = Some(url.to_string());
        *self.ready.lock() = ReadyState::HaveNothing;
        *self.current_time.lock() = 0.0;
    }

    fn source(&self) -> Option<String> {
        self.source.lock().clone()
    }

    fn load(&self) {
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.ready.lock() = self.ready_on_load.lock().unwrap_or(ReadyState::HaveNothing);
    }

    async fn play(&self) -> std::result::Result<(), MediaError> {
        if let Some(code) = self.rejections.lock().pop_front() {
            return Err(MediaError::new(code));
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn seek(&self, seconds: f64) {
        *self.current_time.lock() = seconds;
    }

    fn current_time(&self) -> f64 {
        *self.current_time.lock()
    }

    fn duration(&self) -> Option<f64> {
        *self.duration.lock()
    }

    fn ready_state(&self) -> ReadyState {
        *self.ready.lock()
    }

    fn set_volume(&self, _volume: f64) {}

    fn volume(&self) -> f64 {
        1.0
    }

    fn set_muted(&self, _muted: bool) {}

    fn is_muted(&self) -> bool {
        false
    }

    fn set_playback_rate(&self, _rate: f64) {}
}

// ----------------------------------------------------------------------------
// Caches, notices, now-playing
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct MapPrefetch(pub Mutex<HashMap<String, CachedAudioEntry>>);

impl PrefetchCache for MapPrefetch {
    fn get(&self, chapter_id: &str) -> Option<CachedAudioEntry> {
        self.0.lock().get(chapter_id).cloned()
    }

    fn add(&self, entry: CachedAudioEntry) {
        self.0.lock().insert(entry.chapter_id.clone(), entry);
    }
}

#[derive(Default)]
pub struct Slot(pub Mutex<Option<CachedAudioEntry>>);

impl SingleSlotCache for Slot {
    fn current(&self) -> Option<CachedAudioEntry> {
        self.0.lock().clone()
    }

    fn store(&self, entry: CachedAudioEntry) {
        *self.0.lock() = Some(entry);
    }
}

#[derive(Default)]
pub struct Notices(Mutex<Vec<(String, NoticeSeverity)>>);

impl Notices {
    pub fn count(&self) -> usize {
        self.0.lock().len()
    }
}

impl Notifier for Notices {
    fn notify(&self, message: &str, severity: NoticeSeverity) {
        self.0.lock().push((message.to_string(), severity));
    }
}

#[derive(Default)]
pub struct Surface {
    pub titles: Mutex<Vec<String>>,
    pub statuses: Mutex<Vec<PlaybackStatus>>,
    pub actions: Mutex<Vec<MediaActionKind>>,
}

impl NowPlaying for Surface {
    fn set_metadata(&self, metadata: NowPlayingMetadata) {
        self.titles.lock().push(metadata.title);
    }

    fn set_position_state(&self, _state: PositionState) {}

    fn set_playback_status(&self, status: PlaybackStatus) {
        self.statuses.lock().push(status);
    }

    fn clear(&self) {}

    fn register_actions(&self, actions: &[MediaActionKind]) {
        self.actions.lock().extend_from_slice(actions);
    }
}

// ----------------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------------

pub struct Harness {
    pub engine: Arc<FakeEngine>,
    pub kv: Arc<MemoryStore>,
    pub prefetch: Arc<MapPrefetch>,
    pub slot: Arc<Slot>,
    pub notices: Arc<Notices>,
    pub surface: Arc<Surface>,
    pub core: Arc<PlayerCore>,
}

impl Harness {
    pub fn new(api: Arc<dyn ChapterApi>) -> Self {
        Self::with(api, FakeEngine::instant(), Arc::new(MemoryStore::default()), FeatureFlags::default())
    }

    pub fn with(
        api: Arc<dyn ChapterApi>,
        engine: FakeEngine,
        kv: Arc<MemoryStore>,
        features: FeatureFlags,
    ) -> Self {
        let engine = Arc::new(engine);
        let prefetch = Arc::new(MapPrefetch::default());
        let slot = Arc::new(Slot::default());
        let notices = Arc::new(Notices::default());
        let surface = Arc::new(Surface::default());

        let bridges = PlayerBridges {
            engine: engine.clone(),
            store: kv.clone(),
            chapter_api: api,
            now_playing: Some(surface.clone()),
            notifier: Some(notices.clone()),
            prefetch: Some(prefetch.clone()),
            legacy: Some(slot.clone()),
            clock: Arc::new(ManualClock::at(NOW)),
        };
        let core = PlayerCore::new(bridges, PlayerSettings::default(), features, None)
            .expect("default settings are valid");

        Self {
            engine,
            kv,
            prefetch,
            slot,
            notices,
            surface,
            core,
        }
    }
}

/// Chapter API answering from fixed tables.
#[derive(Default)]
pub struct TableApi {
    pub contexts: Mutex<HashMap<String, ChapterContext>>,
    pub urls: Mutex<HashMap<String, String>>,
    pub url_calls: AtomicUsize,
    pub url_delay: Mutex<Option<Duration>>,
}

impl TableApi {
    pub fn with_context(self, chapter_id: &str, context: ChapterContext) -> Self {
        self.contexts.lock().insert(chapter_id.to_string(), context);
        self
    }

    pub fn with_url(self, chapter_id: &str, url: &str) -> Self {
        self.urls.lock().insert(chapter_id.to_string(), url.to_string());
        self
    }

    /// Make every URL lookup take `delay` of (paused) tokio time.
    pub fn with_url_delay(self, delay: Duration) -> Self {
        *self.url_delay.lock() = Some(delay);
        self
    }
}

#[async_trait]
impl ChapterApi for TableApi {
    async fn resolve_chapter_context(
        &self,
        _book_id: &str,
        chapter_id: &str,
        _interface_id: &str,
    ) -> BridgeResult<ChapterContext> {
        self.contexts
            .lock()
            .get(chapter_id)
            .cloned()
            .ok_or_else(|| BridgeError::Http {
                status: 500,
                message: "context unavailable".into(),
            })
    }

    async fn resolve_playable_url(
        &self,
        _book_id: &str,
        chapter_id: &str,
        _interface_id: &str,
    ) -> BridgeResult<String> {
        self.url_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.url_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.urls
            .lock()
            .get(chapter_id)
            .cloned()
            .ok_or_else(|| BridgeError::Http {
                status: 500,
                message: "url unavailable".into(),
            })
    }
}
