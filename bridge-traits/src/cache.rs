//! Prefetched audio lookups.
//!
//! Both caches are owned and evicted by the host; the core only reads them
//! while resolving the next chapter.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A chapter whose playable URL (and optionally bytes) was fetched ahead of need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAudioEntry {
    pub chapter_id: String,
    pub url: String,
    #[serde(skip)]
    pub blob: Option<Bytes>,
}

impl CachedAudioEntry {
    pub fn new(chapter_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            url: url.into(),
            blob: None,
        }
    }

    pub fn with_blob(mut self, blob: Bytes) -> Self {
        self.blob = Some(blob);
        self
    }
}

/// Capacity-bounded prefetch pool keyed by chapter id.
pub trait PrefetchCache: Send + Sync {
    fn get(&self, chapter_id: &str) -> Option<CachedAudioEntry>;

    fn add(&self, entry: CachedAudioEntry);
}

/// Older single-entry prefetch slot, tagged with the chapter it belongs to.
pub trait SingleSlotCache: Send + Sync {
    fn current(&self) -> Option<CachedAudioEntry>;

    fn store(&self, entry: CachedAudioEntry);

    /// URL from the slot when it was prefetched for `chapter_id`.
    fn url_for(&self, chapter_id: &str) -> Option<String> {
        self.current()
            .filter(|entry| entry.chapter_id == chapter_id)
            .map(|entry| entry.url)
    }
}
