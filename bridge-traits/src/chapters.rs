//! Chapter lookup endpoints.
//!
//! The content backend is keyed by `(bookId, chapterId, interfaceId)`, where
//! the interface id names the upstream content provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A chapter as referenced by its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRef {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

impl ChapterRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Neighbours of a chapter. Ephemeral, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterContext {
    #[serde(default)]
    pub previous_chapter: Option<ChapterRef>,
    #[serde(default)]
    pub next_chapter: Option<ChapterRef>,
}

/// Remote chapter resolution.
#[async_trait]
pub trait ChapterApi: Send + Sync {
    /// Look up the previous and next chapter of `chapter_id`.
    async fn resolve_chapter_context(
        &self,
        book_id: &str,
        chapter_id: &str,
        interface_id: &str,
    ) -> Result<ChapterContext>;

    /// Resolve a playable (typically short-lived, signed) audio URL.
    async fn resolve_playable_url(
        &self,
        book_id: &str,
        chapter_id: &str,
        interface_id: &str,
    ) -> Result<String>;
}
