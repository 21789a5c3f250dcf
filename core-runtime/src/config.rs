//! # Core Configuration Module
//!
//! Provides configuration management for the playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds every host bridge and feature switch the core needs.
//! It enforces fail-fast validation so a missing bridge is reported at startup
//! instead of on the first chapter transition.
//!
//! ## Required Dependencies
//!
//! - `MediaEngine` - The single audio element / native player (always host-provided)
//! - `KeyValueStore` - Session and widget position persistence
//! - `ChapterApi` - Chapter neighbours and playable URL resolution
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `NowPlaying` - Lock-screen controls (desktop default: tracing-backed headless surface)
//! - `Notifier` - User notices (desktop default: tracing-backed notifier)
//! - `PrefetchCache` / `SingleSlotCache` - Prefetched chapter URLs
//! - `HttpClient` - Transport for the default `ChapterApi` (desktop default: reqwest)
//! - `Clock` - Wall clock (default: system clock)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! `KeyValueStore`, `ChapterApi`, `NowPlaying`, `Notifier` and the prefetch
//! caches are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .media_engine(Arc::new(MyAudioElement::new()))
//!     .storage_path("/path/to/player.db")
//!     .api_base_url("https://audiobooks.example.com")
//!     .resume_on_restore(true)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! The builder returns [`Error::CapabilityMissing`] with an actionable message
//! naming the bridge and how each platform is expected to supply it.

use crate::error::{Error, Result};
use bridge_traits::{
    ChapterApi, Clock, HttpClient, KeyValueStore, MediaEngine, Notifier, NowPlaying,
    PrefetchCache, SingleSlotCache, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Number of chapters the default prefetch cache keeps.
pub const DEFAULT_PREFETCH_CAPACITY: usize = 4;

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// SQLite file backing the default key-value store
    pub storage_path: Option<PathBuf>,

    /// Base URL of the chapter backend used by the default `ChapterApi`
    pub api_base_url: Option<String>,

    /// Host media engine (required)
    pub media_engine: Arc<dyn MediaEngine>,

    /// Durable key-value store (required)
    pub key_value_store: Arc<dyn KeyValueStore>,

    /// Chapter resolution (required)
    pub chapter_api: Arc<dyn ChapterApi>,

    pub now_playing: Option<Arc<dyn NowPlaying>>,

    pub notifier: Option<Arc<dyn Notifier>>,

    /// Prefetch pool keyed by chapter id
    pub prefetch_cache: Option<Arc<dyn PrefetchCache>>,

    /// Legacy one-entry prefetch slot
    pub legacy_slot: Option<Arc<dyn SingleSlotCache>>,

    /// HTTP client used by HTTP-backed default bridges
    pub http_client: Option<Arc<dyn HttpClient>>,

    pub clock: Arc<dyn Clock>,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("storage_path", &self.storage_path)
            .field("api_base_url", &self.api_base_url)
            .field("media_engine", &"MediaEngine { ... }")
            .field("key_value_store", &"KeyValueStore { ... }")
            .field("chapter_api", &"ChapterApi { ... }")
            .field(
                "now_playing",
                &self.now_playing.as_ref().map(|_| "NowPlaying { ... }"),
            )
            .field("notifier", &self.notifier.as_ref().map(|_| "Notifier { ... }"))
            .field(
                "prefetch_cache",
                &self.prefetch_cache.as_ref().map(|_| "PrefetchCache { ... }"),
            )
            .field(
                "legacy_slot",
                &self.legacy_slot.as_ref().map(|_| "SingleSlotCache { ... }"),
            )
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Advance to the next chapter when the engine reports `ended`
    pub enable_auto_advance: bool,

    /// Resume playback after restore when the saved session was playing
    pub resume_on_restore: bool,

    /// Register now-playing action handlers (requires a `NowPlaying` bridge)
    pub enable_media_session: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_auto_advance: true,
            resume_on_restore: false,
            enable_media_session: true,
        }
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// Checks that the API base URL is an absolute http(s) URL when present
    /// and that feature flags are consistent with available bridges.
    pub fn validate(&self) -> Result<()> {
        if let Some(base) = &self.api_base_url {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "API base URL must be absolute http(s), got '{}'",
                    base
                )));
            }
        }

        if let Some(path) = &self.storage_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Storage path cannot be empty".to_string()));
            }
        }

        if self.features.enable_media_session && self.now_playing.is_none() {
            return Err(Error::Config(
                "Media session enabled but no NowPlaying bridge provided. \
                 Disable the feature or inject a NowPlaying implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_key_value_store(storage_path: Option<&PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    use bridge_desktop::SqliteKeyValueStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let path = storage_path.cloned().ok_or_else(|| {
        Error::Config(
            "Storage path is required for the default KeyValueStore. \
             Use .storage_path() or inject a KeyValueStore."
                .to_string(),
        )
    })?;

    let init_store = |path: PathBuf| -> Result<_> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default key-value store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteKeyValueStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default KeyValueStore: {}", e))
            })
    };

    // A runtime cannot be blocked on from inside another runtime's worker.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default KeyValueStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_key_value_store(_storage_path: Option<&PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    Err(capability_missing(
        "KeyValueStore",
        "KeyValueStore implementation is required for session persistence. \
         Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteKeyValueStore. \
         Mobile: inject UserDefaults/SharedPreferences storage. \
         Web: inject a localStorage-backed store.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_chapter_api(
    base_url: Option<&String>,
    context_path: Option<&String>,
    http_client: Option<&Arc<dyn HttpClient>>,
) -> Result<Arc<dyn ChapterApi>> {
    use bridge_desktop::{HttpChapterApi, ReqwestHttpClient};

    let base_url = base_url.cloned().ok_or_else(|| {
        Error::Config(
            "API base URL is required for the default ChapterApi. \
             Use .api_base_url() or inject a ChapterApi."
                .to_string(),
        )
    })?;

    let client: Arc<dyn HttpClient> = match http_client {
        Some(client) => Arc::clone(client),
        None => Arc::new(ReqwestHttpClient::new()),
    };

    let mut api = HttpChapterApi::new(client, base_url);
    if let Some(path) = context_path {
        api = api.with_context_path(path.clone());
    }
    let api: Arc<dyn ChapterApi> = Arc::new(api);
    Ok(api)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_chapter_api(
    _base_url: Option<&String>,
    _context_path: Option<&String>,
    _http_client: Option<&Arc<dyn HttpClient>>,
) -> Result<Arc<dyn ChapterApi>> {
    Err(capability_missing(
        "ChapterApi",
        "ChapterApi implementation is required to resolve chapters and audio URLs. \
         Desktop: ensure the 'desktop-shims' feature is enabled to use the default HttpChapterApi. \
         Other hosts: inject an implementation backed by the platform HTTP stack.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_now_playing() -> Option<Arc<dyn NowPlaying>> {
    let surface: Arc<dyn NowPlaying> = Arc::new(bridge_desktop::HeadlessNowPlaying::new());
    Some(surface)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_now_playing() -> Option<Arc<dyn NowPlaying>> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_notifier() -> Option<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = Arc::new(bridge_desktop::TracingNotifier);
    Some(notifier)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_notifier() -> Option<Arc<dyn Notifier>> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_caches() -> (Option<Arc<dyn PrefetchCache>>, Option<Arc<dyn SingleSlotCache>>) {
    use bridge_desktop::{LruPrefetchCache, MemoryAudioSlot};

    let prefetch: Arc<dyn PrefetchCache> =
        Arc::new(LruPrefetchCache::with_capacity(DEFAULT_PREFETCH_CAPACITY));
    let slot: Arc<dyn SingleSlotCache> = Arc::new(MemoryAudioSlot::default());
    (Some(prefetch), Some(slot))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_caches() -> (Option<Arc<dyn PrefetchCache>>, Option<Arc<dyn SingleSlotCache>>) {
    (None, None)
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    storage_path: Option<PathBuf>,
    api_base_url: Option<String>,
    chapter_context_path: Option<String>,
    media_engine: Option<Arc<dyn MediaEngine>>,
    key_value_store: Option<Arc<dyn KeyValueStore>>,
    chapter_api: Option<Arc<dyn ChapterApi>>,
    now_playing: Option<Arc<dyn NowPlaying>>,
    notifier: Option<Arc<dyn Notifier>>,
    prefetch_cache: Option<Arc<dyn PrefetchCache>>,
    legacy_slot: Option<Arc<dyn SingleSlotCache>>,
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the SQLite file used by the default key-value store.
    pub fn storage_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Sets the base URL of the chapter backend (e.g. `https://books.example.com`).
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Route of the neighbour lookup on the default `ChapterApi`.
    ///
    /// Default: `/api/chapter_context`. Ignored when a `ChapterApi` is injected.
    pub fn chapter_context_path(mut self, path: impl Into<String>) -> Self {
        self.chapter_context_path = Some(path.into());
        self
    }

    /// Sets the host media engine (required).
    pub fn media_engine(mut self, engine: Arc<dyn MediaEngine>) -> Self {
        self.media_engine = Some(engine);
        self
    }

    pub fn key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.key_value_store = Some(store);
        self
    }

    pub fn chapter_api(mut self, api: Arc<dyn ChapterApi>) -> Self {
        self.chapter_api = Some(api);
        self
    }

    pub fn now_playing(mut self, surface: Arc<dyn NowPlaying>) -> Self {
        self.now_playing = Some(surface);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn prefetch_cache(mut self, cache: Arc<dyn PrefetchCache>) -> Self {
        self.prefetch_cache = Some(cache);
        self
    }

    pub fn legacy_slot(mut self, slot: Arc<dyn SingleSlotCache>) -> Self {
        self.legacy_slot = Some(slot);
        self
    }

    /// Sets the HTTP client used by HTTP-backed default bridges.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Overrides the wall clock. Tests use this to control session age.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Enables or disables auto-advance on `ended`.
    ///
    /// Default: true
    pub fn enable_auto_advance(mut self, enabled: bool) -> Self {
        self.features.enable_auto_advance = enabled;
        self
    }

    /// Resume playback on restore when the saved session was playing.
    ///
    /// Default: false
    pub fn resume_on_restore(mut self, enabled: bool) -> Self {
        self.features.resume_on_restore = enabled;
        self
    }

    /// Enables or disables now-playing action handlers.
    ///
    /// Requires a `NowPlaying` bridge. Default: true
    pub fn enable_media_session(mut self, enabled: bool) -> Self {
        self.features.enable_media_session = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns an error if:
    /// - The media engine is missing
    /// - A required bridge is missing and no platform default exists
    /// - Configuration values are invalid
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let media_engine = self.media_engine.ok_or_else(|| Error::CapabilityMissing {
            capability: "MediaEngine".to_string(),
            message: "MediaEngine implementation is required; the core never creates its own \
                      player. Web: wrap the shared audio element. Native: wrap the platform player."
                .to_string(),
        })?;

        let key_value_store = match self.key_value_store {
            Some(store) => store,
            None => provide_default_key_value_store(self.storage_path.as_ref())?,
        };

        let chapter_api = match self.chapter_api {
            Some(api) => api,
            None => provide_default_chapter_api(
                self.api_base_url.as_ref(),
                self.chapter_context_path.as_ref(),
                self.http_client.as_ref(),
            )?,
        };

        let (default_prefetch, default_slot) =
            if self.prefetch_cache.is_none() || self.legacy_slot.is_none() {
                provide_default_caches()
            } else {
                (None, None)
            };

        let config = CoreConfig {
            storage_path: self.storage_path,
            api_base_url: self.api_base_url,
            media_engine,
            key_value_store,
            chapter_api,
            now_playing: self.now_playing.or_else(provide_default_now_playing),
            notifier: self.notifier.or_else(provide_default_notifier),
            prefetch_cache: self.prefetch_cache.or(default_prefetch),
            legacy_slot: self.legacy_slot.or(default_slot),
            http_client: self.http_client,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        ChapterContext, MediaActionKind, MediaError, NowPlayingMetadata, PlaybackStatus,
        PositionState, ReadyState,
    };

    struct NullEngine;

    #[async_trait]
    impl MediaEngine for NullEngine {
        fn set_source(&self, _url: &str) {}
        fn source(&self) -> Option<String> {
            None
        }
        fn load(&self) {}
        async fn play(&self) -> std::result::Result<(), MediaError> {
            Ok(())
        }
        fn pause(&self) {}
        fn is_paused(&self) -> bool {
            true
        }
        fn seek(&self, _seconds: f64) {}
        fn current_time(&self) -> f64 {
            0.0
        }
        fn duration(&self) -> Option<f64> {
            None
        }
        fn ready_state(&self) -> ReadyState {
            ReadyState::HaveNothing
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

    struct NullStore;

    #[async_trait]
    impl KeyValueStore for NullStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }
        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Ok(None)
        }
        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }
        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct NullChapters;

    #[async_trait]
    impl ChapterApi for NullChapters {
        async fn resolve_chapter_context(
            &self,
            _book_id: &str,
            _chapter_id: &str,
            _interface_id: &str,
        ) -> BridgeResult<ChapterContext> {
            Ok(ChapterContext::default())
        }
        async fn resolve_playable_url(
            &self,
            _book_id: &str,
            chapter_id: &str,
            _interface_id: &str,
        ) -> BridgeResult<String> {
            Ok(format!("https://cdn.test/{}.mp3", chapter_id))
        }
    }

    struct NullSurface;

    impl NowPlaying for NullSurface {
        fn set_metadata(&self, _metadata: NowPlayingMetadata) {}
        fn set_position_state(&self, _state: PositionState) {}
        fn set_playback_status(&self, _status: PlaybackStatus) {}
        fn clear(&self) {}
        fn register_actions(&self, _actions: &[MediaActionKind]) {}
    }

    fn explicit_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .media_engine(Arc::new(NullEngine))
            .key_value_store(Arc::new(NullStore))
            .chapter_api(Arc::new(NullChapters))
            .now_playing(Arc::new(NullSurface))
    }

    #[test]
    fn test_build_with_explicit_bridges() {
        let config = explicit_builder()
            .api_base_url("https://books.example.com")
            .resume_on_restore(true)
            .build()
            .unwrap();

        assert!(config.features.enable_auto_advance);
        assert!(config.features.resume_on_restore);
        assert_eq!(
            config.api_base_url.as_deref(),
            Some("https://books.example.com")
        );
    }

    #[test]
    fn test_missing_media_engine_is_capability_error() {
        let err = CoreConfig::builder()
            .key_value_store(Arc::new(NullStore))
            .chapter_api(Arc::new(NullChapters))
            .build()
            .unwrap_err();

        match err {
            Error::CapabilityMissing { capability, .. } => assert_eq!(capability, "MediaEngine"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let err = explicit_builder()
            .api_base_url("books.example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_media_session_requires_now_playing() {
        let err = CoreConfig::builder()
            .media_engine(Arc::new(NullEngine))
            .key_value_store(Arc::new(NullStore))
            .chapter_api(Arc::new(NullChapters))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = CoreConfig::builder()
            .media_engine(Arc::new(NullEngine))
            .key_value_store(Arc::new(NullStore))
            .chapter_api(Arc::new(NullChapters))
            .enable_media_session(false)
            .build()
            .unwrap();
        assert!(config.now_playing.is_none());
        assert!(config.prefetch_cache.is_none());
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_store_without_shims() {
        let err = CoreConfig::builder()
            .media_engine(Arc::new(NullEngine))
            .chapter_api(Arc::new(NullChapters))
            .build()
            .unwrap_err();
        match err {
            Error::CapabilityMissing { capability, .. } => {
                assert_eq!(capability, "KeyValueStore")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&base).unwrap();

        let config = CoreConfig::builder()
            .media_engine(Arc::new(NullEngine))
            .storage_path(base.join("player.db"))
            .api_base_url("https://books.example.com")
            .build()
            .expect("desktop defaults should succeed");

        assert!(config.now_playing.is_some());
        assert!(config.notifier.is_some());
        assert!(config.prefetch_cache.is_some());

        let store = config.key_value_store.clone();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            store.set_string("globalPlayerState", "{}").await.unwrap();
            assert_eq!(
                store.get_string("globalPlayerState").await.unwrap().as_deref(),
                Some("{}")
            );
        });

        drop(config);
        let _ = std::fs::remove_dir_all(&base);
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_need_base_url() {
        let err = CoreConfig::builder()
            .media_engine(Arc::new(NullEngine))
            .key_value_store(Arc::new(NullStore))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_chapter_context_path_reaches_default_api() {
        use bridge_traits::{HttpRequest, HttpResponse};
        use std::sync::Mutex;

        #[derive(Default)]
        struct RecordingHttp {
            urls: Mutex<Vec<String>>,
        }

        #[async_trait]
        impl HttpClient for RecordingHttp {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
                self.urls.lock().unwrap().push(request.url);
                Ok(HttpResponse {
                    status: 200,
                    headers: Default::default(),
                    body: br#"{"previousChapter":null,"nextChapter":null}"#.to_vec().into(),
                })
            }
        }

        let http = Arc::new(RecordingHttp::default());
        let config = CoreConfig::builder()
            .media_engine(Arc::new(NullEngine))
            .key_value_store(Arc::new(NullStore))
            .api_base_url("https://books.example.com")
            .chapter_context_path("/v2/neighbours")
            .http_client(http.clone())
            .build()
            .unwrap();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            config
                .chapter_api
                .resolve_chapter_context("b1", "c7", "x")
                .await
                .unwrap();
        });

        assert_eq!(
            http.urls.lock().unwrap().as_slice(),
            ["https://books.example.com/v2/neighbours".to_string()]
        );
    }
}
