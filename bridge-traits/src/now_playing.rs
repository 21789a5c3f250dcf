//! Now-Playing Integration
//!
//! Lock-screen / notification media controls (Media Session API on the web,
//! MPNowPlayingInfoCenter on iOS, MediaSession on Android). The core pushes
//! metadata and position; the host forwards user actions back as
//! [`MediaAction`]s.

use serde::{Deserialize, Serialize};

/// Artwork image for the now-playing surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub src: String,
    /// e.g. `"512x512"`
    pub sizes: Option<String>,
    /// MIME type, e.g. `"image/jpeg"`
    pub mime_type: Option<String>,
}

impl Artwork {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            sizes: None,
            mime_type: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingMetadata {
    /// Chapter title
    pub title: String,
    /// Book title
    pub album: String,
    pub artwork: Vec<Artwork>,
}

/// Position snapshot; all values in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub duration: f64,
    pub playback_rate: f64,
    pub position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    None,
    Paused,
    Playing,
}

/// User action raised by the now-playing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MediaAction {
    Play,
    Pause,
    /// Absolute position in seconds
    SeekTo(f64),
    /// Relative skip in seconds
    SeekForward(f64),
    SeekBackward(f64),
    NextTrack,
    PreviousTrack,
}

/// Action kinds a host should wire handlers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaActionKind {
    Play,
    Pause,
    SeekTo,
    SeekForward,
    SeekBackward,
    NextTrack,
    PreviousTrack,
}

impl MediaActionKind {
    pub const ALL: [MediaActionKind; 7] = [
        MediaActionKind::Play,
        MediaActionKind::Pause,
        MediaActionKind::SeekTo,
        MediaActionKind::SeekForward,
        MediaActionKind::SeekBackward,
        MediaActionKind::NextTrack,
        MediaActionKind::PreviousTrack,
    ];
}

/// Now-playing surface driven by the core.
///
/// All calls are fire-and-forget; implementations swallow host failures.
pub trait NowPlaying: Send + Sync {
    fn set_metadata(&self, metadata: NowPlayingMetadata);

    fn set_position_state(&self, state: PositionState);

    fn set_playback_status(&self, status: PlaybackStatus);

    /// Drop metadata and position (explicit stop).
    fn clear(&self);

    /// Declare which actions the core will handle. Called once at startup.
    fn register_actions(&self, actions: &[MediaActionKind]);
}
