//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `KeyValueStore` using SQLite via `sqlx`
//! - `HttpClient` using `reqwest`
//! - `ChapterApi` over the backend's JSON endpoints
//! - `PrefetchCache` / `SingleSlotCache` kept in process memory
//! - `Notifier` and `NowPlaying` routed into `tracing`
//!
//! The media engine itself is always host-provided.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HttpChapterApi, ReqwestHttpClient, SqliteKeyValueStore};
//! use std::sync::Arc;
//!
//! let store = SqliteKeyValueStore::new("data/player.db".into()).await?;
//! let api = HttpChapterApi::new(Arc::new(ReqwestHttpClient::new()), "https://books.example");
//! ```

mod cache;
mod chapter_api;
mod http;
mod kv_store;
mod notice;
mod now_playing;

pub use cache::{LruPrefetchCache, MemoryAudioSlot};
pub use chapter_api::{ensure_https, HttpChapterApi};
pub use http::ReqwestHttpClient;
pub use kv_store::SqliteKeyValueStore;
pub use notice::TracingNotifier;
pub use now_playing::HeadlessNowPlaying;
