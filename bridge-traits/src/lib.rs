//! # Host Bridge Traits
//!
//! Capabilities the playback core needs from its host but cannot provide
//! itself. Each host (browser shell, desktop, mobile) ships adapters for them.
//!
//! ## Traits
//!
//! ### Playback
//! - [`MediaEngine`](media::MediaEngine) - The single audio element / native player
//! - [`NowPlaying`](now_playing::NowPlaying) - Lock-screen and notification controls
//!
//! ### Content
//! - [`ChapterApi`](chapters::ChapterApi) - Chapter neighbours and playable URLs
//! - [`PrefetchCache`](cache::PrefetchCache) - Prefetched chapter URLs by id
//! - [`SingleSlotCache`](cache::SingleSlotCache) - Legacy one-entry prefetch slot
//! - [`HttpClient`](http::HttpClient) - Transport used by HTTP-backed adapters
//!
//! ### Persistence & Platform
//! - [`KeyValueStore`](storage::KeyValueStore) - Durable same-origin key-value storage
//! - [`Notifier`](notice::Notifier) - User-visible notices
//! - [`Clock`](time::Clock) - Wall clock for session timestamps
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to the host
//!
//! ## Error Handling
//!
//! Fallible bridges return [`BridgeError`](error::BridgeError). Fire-and-forget
//! bridges (`NowPlaying`, `Notifier`, caches) swallow host failures themselves.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so the core can share them across
//! tasks behind `Arc`.

pub mod cache;
pub mod chapters;
pub mod error;
pub mod http;
pub mod media;
pub mod notice;
pub mod now_playing;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use cache::{CachedAudioEntry, PrefetchCache, SingleSlotCache};
pub use chapters::{ChapterApi, ChapterContext, ChapterRef};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use media::{MediaEngine, MediaError, MediaErrorCode, MediaEvent, ReadyState};
pub use notice::{NoticeSeverity, Notifier};
pub use now_playing::{
    Artwork, MediaAction, MediaActionKind, NowPlaying, NowPlayingMetadata, PlaybackStatus,
    PositionState,
};
pub use storage::KeyValueStore;
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
