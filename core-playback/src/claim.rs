//! Transition claims.
//!
//! A page-level helper that switches chapters itself marks the target chapter
//! here first. The advance coordinator checks the marker and backs off when
//! the chapter it resolved is already being handled.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Default)]
pub struct TransitionClaim {
    claimed: Arc<Mutex<Option<String>>>,
}

impl TransitionClaim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the transition to `chapter_id`. Fails while any claim is held.
    pub fn claim(&self, chapter_id: &str) -> bool {
        let mut claimed = self.claimed.lock();
        if let Some(existing) = claimed.as_deref() {
            debug!(existing, requested = chapter_id, "Transition already claimed");
            return false;
        }
        *claimed = Some(chapter_id.to_string());
        debug!(chapter_id, "Transition claimed");
        true
    }

    pub fn release(&self) {
        if let Some(chapter_id) = self.claimed.lock().take() {
            debug!(chapter_id = %chapter_id, "Transition claim released");
        }
    }

    /// Take the claim if it names `chapter_id`.
    pub fn consume(&self, chapter_id: &str) -> bool {
        let mut claimed = self.claimed.lock();
        if claimed.as_deref() == Some(chapter_id) {
            *claimed = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<String> {
        self.claimed.lock().clone()
    }

    pub fn is_claimed(&self, chapter_id: &str) -> bool {
        self.claimed.lock().as_deref() == Some(chapter_id)
    }
}

impl std::fmt::Debug for TransitionClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionClaim")
            .field("claimed", &*self.claimed.lock())
            .finish()
    }
}
