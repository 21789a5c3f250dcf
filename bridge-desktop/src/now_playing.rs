//! Now-playing surface for hosts without OS media controls.

use bridge_traits::{MediaActionKind, NowPlaying, NowPlayingMetadata, PlaybackStatus, PositionState};
use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Surface {
    metadata: Option<NowPlayingMetadata>,
    position: Option<PositionState>,
    status: Option<PlaybackStatus>,
    actions: Vec<MediaActionKind>,
}

/// Keeps the last published state in memory and logs changes.
///
/// Useful for CLI hosts and as an inspection point in tests.
#[derive(Debug, Default)]
pub struct HeadlessNowPlaying {
    surface: Mutex<Surface>,
}

impl HeadlessNowPlaying {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self) -> Option<NowPlayingMetadata> {
        self.surface.lock().metadata.clone()
    }

    pub fn position(&self) -> Option<PositionState> {
        self.surface.lock().position
    }

    pub fn status(&self) -> PlaybackStatus {
        self.surface.lock().status.unwrap_or(PlaybackStatus::None)
    }

    pub fn registered_actions(&self) -> Vec<MediaActionKind> {
        self.surface.lock().actions.clone()
    }
}

impl NowPlaying for HeadlessNowPlaying {
    fn set_metadata(&self, metadata: NowPlayingMetadata) {
        info!(title = %metadata.title, album = %metadata.album, "Now playing");
        self.surface.lock().metadata = Some(metadata);
    }

    fn set_position_state(&self, state: PositionState) {
        self.surface.lock().position = Some(state);
    }

    fn set_playback_status(&self, status: PlaybackStatus) {
        let mut surface = self.surface.lock();
        if surface.status != Some(status) {
            debug!(?status, "Playback status");
        }
        surface.status = Some(status);
    }

    fn clear(&self) {
        let mut surface = self.surface.lock();
        surface.metadata = None;
        surface.position = None;
        surface.status = Some(PlaybackStatus::None);
    }

    fn register_actions(&self, actions: &[MediaActionKind]) {
        let mut surface = self.surface.lock();
        for action in actions {
            if !surface.actions.contains(action) {
                surface.actions.push(*action);
            }
        }
    }
}
