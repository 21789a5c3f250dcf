//! Hand-written bridge doubles shared by the unit tests.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, ChapterApi, ChapterContext, Clock, KeyValueStore, MediaActionKind, MediaEngine,
    MediaError, MediaErrorCode, NoticeSeverity, Notifier, NowPlaying, NowPlayingMetadata,
    PlaybackStatus, PositionState, ReadyState,
};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

// ----------------------------------------------------------------------------
// Clock
// ----------------------------------------------------------------------------

pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn at(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_millis())
            .single()
            .unwrap_or_default()
    }

    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

// ----------------------------------------------------------------------------
// Key-value store
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn insert(&self, key: &str, value: &str) {
        self.data.lock().insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).cloned()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("quota exceeded".into()));
        }
        self.insert(key, value);
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BridgeError::NotAvailable("storage disabled".into()));
        }
        Ok(self.get(key))
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("quota exceeded".into()));
        }
        self.data.lock().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.data.lock().keys().cloned().collect())
    }
}

// ----------------------------------------------------------------------------
// Media engine
// ----------------------------------------------------------------------------

struct EngineState {
    source: Option<String>,
    sources: Vec<String>,
    load_count: usize,
    ready_state: ReadyState,
    ready_on_load: Option<ReadyState>,
    duration: Option<f64>,
    current_time: f64,
    paused: bool,
    volume: f64,
    muted: bool,
    rate: f64,
    seeks: Vec<f64>,
    rejections: VecDeque<MediaErrorCode>,
}

/// Engine double. With `ready_on_load` set, every `load()` makes the
/// engine ready immediately, which exercises the already-ready path.
pub struct MockEngine {
    state: Mutex<EngineState>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            state: Mutex::new(EngineState {
                source: None,
                sources: Vec::new(),
                load_count: 0,
                ready_state: ReadyState::HaveNothing,
                ready_on_load: None,
                duration: None,
                current_time: 0.0,
                paused: true,
                volume: 1.0,
                muted: false,
                rate: 1.0,
                seeks: Vec::new(),
                rejections: VecDeque::new(),
            }),
        }
    }
}

impl MockEngine {
    pub fn ready_on_load(ready_state: ReadyState) -> Self {
        let engine = Self::default();
        engine.set_ready_on_load(Some(ready_state));
        engine
    }

    pub fn set_ready_on_load(&self, ready_state: Option<ReadyState>) {
        self.state.lock().ready_on_load = ready_state;
    }

    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.state.lock().ready_state = ready_state;
    }

    pub fn set_duration(&self, duration: Option<f64>) {
        self.state.lock().duration = duration;
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.state.lock().current_time = seconds;
    }

    pub fn reject_next_play(&self, code: MediaErrorCode) {
        self.state.lock().rejections.push_back(code);
    }

    pub fn load_count(&self) -> usize {
        self.state.lock().load_count
    }

    pub fn sources(&self) -> Vec<String> {
        self.state.lock().sources.clone()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().seeks.clone()
    }
}

#[async_trait]
impl MediaEngine for MockEngine {
    fn set_source(&self, url: &str) {
        let mut state = self.state.lock();
        state.source = Some(url.to_string());
        state.sources.push(url.to_string());
        state.ready_state = ReadyState::HaveNothing;
        state.current_time = 0.0;
    }

    fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    fn load(&self) {
        let mut state = self.state.lock();
        state.load_count += 1;
        state.ready_state = state.ready_on_load.unwrap_or(ReadyState::HaveNothing);
    }

    async fn play(&self) -> std::result::Result<(), MediaError> {
        let mut state = self.state.lock();
        if let Some(code) = state.rejections.pop_front() {
            return Err(MediaError::new(code));
        }
        state.paused = false;
        Ok(())
    }

    fn pause(&self) {
        self.state.lock().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn seek(&self, seconds: f64) {
        let mut state = self.state.lock();
        state.current_time = seconds;
        state.seeks.push(seconds);
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }

    fn ready_state(&self) -> ReadyState {
        self.state.lock().ready_state
    }

    fn set_volume(&self, volume: f64) {
        self.state.lock().volume = volume;
    }

    fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    fn set_muted(&self, muted: bool) {
        self.state.lock().muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    fn set_playback_rate(&self, rate: f64) {
        self.state.lock().rate = rate;
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().rate
    }
}

// ----------------------------------------------------------------------------
// Notices and now-playing
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, NoticeSeverity)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, NoticeSeverity)> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: NoticeSeverity) {
        self.messages.lock().push((message.to_string(), severity));
    }
}

#[derive(Default)]
pub struct RecordingNowPlaying {
    metadata: Mutex<Vec<NowPlayingMetadata>>,
    positions: Mutex<Vec<PositionState>>,
    statuses: Mutex<Vec<PlaybackStatus>>,
    actions: Mutex<Vec<MediaActionKind>>,
    cleared: AtomicBool,
}

impl RecordingNowPlaying {
    pub fn last_metadata(&self) -> Option<NowPlayingMetadata> {
        self.metadata.lock().last().cloned()
    }

    pub fn positions(&self) -> Vec<PositionState> {
        self.positions.lock().clone()
    }

    pub fn last_status(&self) -> Option<PlaybackStatus> {
        self.statuses.lock().last().copied()
    }

    pub fn registered_actions(&self) -> Vec<MediaActionKind> {
        self.actions.lock().clone()
    }

    pub fn cleared(&self) -> bool {
        self.cleared.load(Ordering::SeqCst)
    }
}

impl NowPlaying for RecordingNowPlaying {
    fn set_metadata(&self, metadata: NowPlayingMetadata) {
        self.metadata.lock().push(metadata);
    }

    fn set_position_state(&self, state: PositionState) {
        self.positions.lock().push(state);
    }

    fn set_playback_status(&self, status: PlaybackStatus) {
        self.statuses.lock().push(status);
    }

    fn clear(&self) {
        self.cleared.store(true, Ordering::SeqCst);
    }

    fn register_actions(&self, actions: &[MediaActionKind]) {
        self.actions.lock().extend_from_slice(actions);
    }
}

// ----------------------------------------------------------------------------
// Chapter API
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct StaticChapterApi {
    urls: Mutex<HashMap<String, String>>,
    contexts: Mutex<HashMap<String, ChapterContext>>,
    url_calls: AtomicUsize,
    context_calls: AtomicUsize,
}

impl StaticChapterApi {
    pub fn set_url(&self, chapter_id: &str, url: &str) {
        self.urls.lock().insert(chapter_id.to_string(), url.to_string());
    }

    pub fn set_context(&self, chapter_id: &str, context: ChapterContext) {
        self.contexts.lock().insert(chapter_id.to_string(), context);
    }

    pub fn url_calls(&self) -> usize {
        self.url_calls.load(Ordering::SeqCst)
    }

    pub fn context_calls(&self) -> usize {
        self.context_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChapterApi for StaticChapterApi {
    async fn resolve_chapter_context(
        &self,
        _book_id: &str,
        chapter_id: &str,
        _interface_id: &str,
    ) -> BridgeResult<ChapterContext> {
        self.context_calls.fetch_add(1, Ordering::SeqCst);
        self.contexts
            .lock()
            .get(chapter_id)
            .cloned()
            .ok_or_else(|| BridgeError::Http {
                status: 404,
                message: format!("no context for {chapter_id}"),
            })
    }

    async fn resolve_playable_url(
        &self,
        _book_id: &str,
        chapter_id: &str,
        _interface_id: &str,
    ) -> BridgeResult<String> {
        self.url_calls.fetch_add(1, Ordering::SeqCst);
        self.urls
            .lock()
            .get(chapter_id)
            .cloned()
            .ok_or_else(|| BridgeError::Http {
                status: 404,
                message: format!("no audio for {chapter_id}"),
            })
    }
}
