//! Playable URL lookup shared by chapter switches, restore and resume.
//!
//! First hit wins: the prefetch cache, then the legacy single slot (only when
//! it holds the requested chapter), then the backend.

use bridge_traits::{BridgeError, ChapterApi, PrefetchCache, SingleSlotCache};
use std::sync::Arc;
use tracing::debug;

use crate::error::{PlaybackError, Result};
use crate::session::TrackIdentity;

/// Where a chapter's playable URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    PrefetchCache,
    LegacySlot,
    Network,
    PreResolved,
}

impl UrlSource {
    pub fn as_str(self) -> &'static str {
        match self {
            UrlSource::PrefetchCache => "prefetch",
            UrlSource::LegacySlot => "legacy-slot",
            UrlSource::Network => "network",
            UrlSource::PreResolved => "pre-resolved",
        }
    }
}

#[derive(Clone)]
pub(crate) struct UrlResolver {
    chapter_api: Arc<dyn ChapterApi>,
    prefetch: Option<Arc<dyn PrefetchCache>>,
    legacy: Option<Arc<dyn SingleSlotCache>>,
}

impl UrlResolver {
    pub fn new(
        chapter_api: Arc<dyn ChapterApi>,
        prefetch: Option<Arc<dyn PrefetchCache>>,
        legacy: Option<Arc<dyn SingleSlotCache>>,
    ) -> Self {
        Self {
            chapter_api,
            prefetch,
            legacy,
        }
    }

    pub fn chapter_api(&self) -> &Arc<dyn ChapterApi> {
        &self.chapter_api
    }

    pub async fn resolve(&self, target: &TrackIdentity) -> std::result::Result<(String, UrlSource), BridgeError> {
        if let Some(entry) = self.prefetch.as_ref().and_then(|cache| cache.get(&target.chapter_id)) {
            debug!(chapter_id = %target.chapter_id, "URL from prefetch cache");
            return Ok((entry.url, UrlSource::PrefetchCache));
        }

        if let Some(url) = self.legacy.as_ref().and_then(|slot| slot.url_for(&target.chapter_id)) {
            debug!(chapter_id = %target.chapter_id, "URL from legacy slot");
            return Ok((url, UrlSource::LegacySlot));
        }

        let url = self.fetch(target).await?;
        Ok((url, UrlSource::Network))
    }

    /// Backend only. Used when a cached URL has just failed.
    pub async fn fetch(&self, target: &TrackIdentity) -> std::result::Result<String, BridgeError> {
        self.chapter_api
            .resolve_playable_url(&target.book_id, &target.chapter_id, &target.interface_id)
            .await
    }

    pub async fn resolve_for_playback(&self, target: &TrackIdentity) -> Result<String> {
        self.resolve(target)
            .await
            .map(|(url, _)| url)
            .map_err(|source| PlaybackError::Resolution {
                chapter_id: target.chapter_id.clone(),
                source,
            })
    }
}

impl std::fmt::Debug for UrlResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlResolver")
            .field("prefetch", &self.prefetch.is_some())
            .field("legacy", &self.legacy.is_some())
            .finish()
    }
}
