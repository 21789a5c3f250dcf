//! In-process prefetch caches.

use bridge_traits::{CachedAudioEntry, PrefetchCache, SingleSlotCache};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use tracing::debug;

/// Capacity-bounded prefetch pool; the least recently used chapter is
/// evicted first.
pub struct LruPrefetchCache {
    entries: Mutex<LruCache<String, CachedAudioEntry>>,
}

impl LruPrefetchCache {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl PrefetchCache for LruPrefetchCache {
    fn get(&self, chapter_id: &str) -> Option<CachedAudioEntry> {
        self.entries.lock().get(chapter_id).cloned()
    }

    fn add(&self, entry: CachedAudioEntry) {
        let chapter_id = entry.chapter_id.clone();
        debug!(chapter_id = %chapter_id, "Prefetched chapter cached");
        if let Some((evicted, _)) = self.entries.lock().push(chapter_id.clone(), entry) {
            if evicted != chapter_id {
                debug!(chapter_id = %evicted, "Prefetch entry evicted");
            }
        }
    }
}

/// Single-entry slot; storing replaces whatever was there.
#[derive(Default)]
pub struct MemoryAudioSlot {
    entry: Mutex<Option<CachedAudioEntry>>,
}

impl SingleSlotCache for MemoryAudioSlot {
    fn current(&self) -> Option<CachedAudioEntry> {
        self.entry.lock().clone()
    }

    fn store(&self, entry: CachedAudioEntry) {
        *self.entry.lock() = Some(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_eviction() {
        let cache = LruPrefetchCache::with_capacity(2);
        cache.add(CachedAudioEntry::new("c1", "blob:1"));
        cache.add(CachedAudioEntry::new("c2", "blob:2"));

        // Touch c1 so c2 becomes the eviction candidate.
        assert!(cache.get("c1").is_some());
        cache.add(CachedAudioEntry::new("c3", "blob:3"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("c2").is_none());
        assert_eq!(cache.get("c1").unwrap().url, "blob:1");
    }

    #[test]
    fn test_readding_replaces_entry() {
        let cache = LruPrefetchCache::with_capacity(0);
        cache.add(CachedAudioEntry::new("c1", "blob:old"));
        cache.add(CachedAudioEntry::new("c1", "blob:new"));
        assert_eq!(cache.get("c1").unwrap().url, "blob:new");
    }

    #[test]
    fn test_slot_matches_chapter() {
        let slot = MemoryAudioSlot::default();
        assert!(slot.url_for("c1").is_none());

        slot.store(CachedAudioEntry::new("c1", "blob:1"));
        assert_eq!(slot.url_for("c1").as_deref(), Some("blob:1"));
        assert!(slot.url_for("c2").is_none());

        slot.store(CachedAudioEntry::new("c2", "blob:2"));
        assert!(slot.url_for("c1").is_none());
    }
}
