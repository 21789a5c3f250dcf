//! # Session Store
//!
//! Persists the [`PlaybackSession`] under one key of the host key-value store
//! and applies the TTL policy on restore. Storage failures never reach
//! callers: they are logged and treated as "no saved state".

use bridge_traits::{Clock, KeyValueStore};
use core_runtime::logging::redact_url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::PlayerSettings;
use crate::session::{PlaybackSession, SessionHandle};

pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: String,
    ttl: Duration,
    /// Serializes writes so a stale snapshot never lands after a newer one.
    write_lock: tokio::sync::Mutex<()>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, settings: &PlayerSettings) -> Self {
        Self {
            store,
            clock,
            key: settings.session_key.clone(),
            ttl: settings.session_ttl(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serialize `session` to the store.
    pub async fn save(&self, session: &PlaybackSession) {
        let _guard = self.write_lock.lock().await;
        self.write(session).await;
    }

    /// Persist whatever the handle holds at the moment the write lock is taken.
    ///
    /// Concurrent callers may each have mutated the session; reading it under
    /// the lock guarantees the last write carries the latest state.
    pub(crate) async fn save_latest(&self, handle: &SessionHandle) {
        let _guard = self.write_lock.lock().await;
        if let Some(session) = handle.snapshot() {
            self.write(&session).await;
        }
    }

    async fn write(&self, session: &PlaybackSession) {
        let json = match serde_json::to_string(session) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize playback session");
                return;
            }
        };

        if let Err(e) = self.store.set_string(&self.key, &json).await {
            warn!(key = %self.key, error = %e, "Failed to persist playback session");
        }
    }

    /// Read the saved session, dropping its audio URL when older than the TTL.
    pub async fn restore(&self) -> Option<PlaybackSession> {
        let raw = match self.store.get_string(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read playback session");
                return None;
            }
        };

        let mut session: PlaybackSession = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding corrupt playback session");
                if let Err(e) = self.store.delete(&self.key).await {
                    warn!(key = %self.key, error = %e, "Failed to delete corrupt playback session");
                }
                return None;
            }
        };

        let age_ms = session.age_ms(self.clock.now_millis());
        if age_ms as u128 > self.ttl.as_millis() {
            if let Some(url) = session.audio_url.take() {
                info!(
                    chapter_id = %session.chapter_id,
                    age_ms,
                    url = %redact_url(&url),
                    "Saved audio URL expired; keeping chapter identity"
                );
            }
        } else {
            debug!(chapter_id = %session.chapter_id, age_ms, "Restored playback session");
        }

        Some(session)
    }

    /// Remove the record (explicit stop).
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.store.delete(&self.key).await {
            warn!(key = %self.key, error = %e, "Failed to clear playback session");
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish()
    }
}
