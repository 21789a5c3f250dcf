//! Bridges session changes to the host's now-playing surface.

use bridge_traits::{
    Artwork, MediaActionKind, NowPlaying, NowPlayingMetadata, PlaybackStatus, PositionState,
};
use std::sync::Arc;
use tracing::trace;

use crate::session::TrackIdentity;

/// Thin wrapper that turns a missing surface into no-ops.
#[derive(Clone, Default)]
pub struct NowPlayingPublisher {
    surface: Option<Arc<dyn NowPlaying>>,
}

impl NowPlayingPublisher {
    pub fn new(surface: Option<Arc<dyn NowPlaying>>) -> Self {
        Self { surface }
    }

    pub fn is_enabled(&self) -> bool {
        self.surface.is_some()
    }

    pub fn publish_metadata(&self, identity: &TrackIdentity) {
        let Some(surface) = &self.surface else {
            return;
        };

        let title = if identity.chapter_title.is_empty() {
            identity.chapter_id.clone()
        } else {
            identity.chapter_title.clone()
        };

        surface.set_metadata(NowPlayingMetadata {
            title,
            album: identity.book_title.clone(),
            artwork: identity
                .book_image
                .iter()
                .filter(|src| !src.is_empty())
                .map(|src| Artwork::new(src.clone()))
                .collect(),
        });
    }

    /// Push a position snapshot. Skipped until the duration is known.
    pub fn publish_position(&self, duration: Option<f64>, playback_rate: f64, position: f64) {
        let Some(surface) = &self.surface else {
            return;
        };
        let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) else {
            trace!("Skipping position state: duration unknown");
            return;
        };
        if !(playback_rate.is_finite() && playback_rate > 0.0) {
            return;
        }

        let position = if position.is_finite() {
            position.clamp(0.0, duration)
        } else {
            0.0
        };

        surface.set_position_state(PositionState {
            duration,
            playback_rate,
            position,
        });
    }

    pub fn publish_status(&self, paused: bool) {
        if let Some(surface) = &self.surface {
            surface.set_playback_status(if paused {
                PlaybackStatus::Paused
            } else {
                PlaybackStatus::Playing
            });
        }
    }

    pub fn clear(&self) {
        if let Some(surface) = &self.surface {
            surface.clear();
        }
    }

    pub fn register_actions(&self) {
        if let Some(surface) = &self.surface {
            surface.register_actions(&MediaActionKind::ALL);
        }
    }
}
