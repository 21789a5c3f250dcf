//! Media Engine Bridge
//!
//! The host owns the actual audio element / native player. The core drives it
//! through [`MediaEngine`] and receives its notifications as [`MediaEvent`]s,
//! which the host forwards into the core in the order they occur.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far the engine has progressed loading the current source.
///
/// Mirrors `HTMLMediaElement.readyState`; ordering is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl ReadyState {
    /// Duration and seekable range are known.
    pub fn has_metadata(self) -> bool {
        self >= ReadyState::HaveMetadata
    }

    pub fn from_level(level: u8) -> Self {
        match level {
            0 => ReadyState::HaveNothing,
            1 => ReadyState::HaveMetadata,
            2 => ReadyState::HaveCurrentData,
            3 => ReadyState::HaveFutureData,
            _ => ReadyState::HaveEnoughData,
        }
    }
}

/// Engine-reported failure category, assigned where the error originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaErrorCode {
    /// Fetch aborted at the user's request (`MEDIA_ERR_ABORTED`)
    Aborted,
    /// Network failure while fetching (`MEDIA_ERR_NETWORK`)
    Network,
    /// Source fetched but could not be decoded (`MEDIA_ERR_DECODE`)
    Decode,
    /// Source format or URL unusable (`MEDIA_ERR_SRC_NOT_SUPPORTED`)
    SrcNotSupported,
    /// `play()` rejected by autoplay policy
    NotAllowed,
}

impl MediaErrorCode {
    /// Map the numeric `MediaError.code` used by web engines.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(MediaErrorCode::Aborted),
            2 => Some(MediaErrorCode::Network),
            3 => Some(MediaErrorCode::Decode),
            4 => Some(MediaErrorCode::SrcNotSupported),
            _ => None,
        }
    }
}

/// Error emitted by the engine or returned from [`MediaEngine::play`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaError {
    pub code: MediaErrorCode,
    /// The source the engine was working on when it failed
    pub source_url: Option<String>,
    pub message: Option<String>,
}

impl MediaError {
    pub fn new(code: MediaErrorCode) -> Self {
        Self {
            code,
            source_url: None,
            message: None,
        }
    }

    pub fn with_source(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.code)?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for MediaError {}

/// Notifications from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaEvent {
    LoadedMetadata,
    CanPlay,
    CanPlayThrough,
    Play,
    Pause,
    TimeUpdate,
    VolumeChange,
    RateChange,
    Ended,
    Error(MediaError),
}

impl MediaEvent {
    /// Whether this event signals the source can be played.
    pub fn is_readiness(&self) -> bool {
        matches!(
            self,
            MediaEvent::LoadedMetadata | MediaEvent::CanPlay | MediaEvent::CanPlayThrough
        )
    }

    /// DOM event name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            MediaEvent::LoadedMetadata => "loadedmetadata",
            MediaEvent::CanPlay => "canplay",
            MediaEvent::CanPlayThrough => "canplaythrough",
            MediaEvent::Play => "play",
            MediaEvent::Pause => "pause",
            MediaEvent::TimeUpdate => "timeupdate",
            MediaEvent::VolumeChange => "volumechange",
            MediaEvent::RateChange => "ratechange",
            MediaEvent::Ended => "ended",
            MediaEvent::Error(_) => "error",
        }
    }
}

/// The single host media-playback engine.
///
/// Control calls are synchronous, as on an audio element; only `play` is
/// asynchronous because the host may reject it (autoplay policy, abort).
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Assign a new source without starting to fetch it.
    fn set_source(&self, url: &str);

    /// Currently assigned source, if any.
    fn source(&self) -> Option<String>;

    /// Begin fetching the assigned source.
    fn load(&self);

    /// Start or resume playback.
    async fn play(&self) -> std::result::Result<(), MediaError>;

    fn pause(&self);

    fn is_paused(&self) -> bool;

    /// Jump to an absolute position in seconds.
    fn seek(&self, seconds: f64);

    fn current_time(&self) -> f64;

    /// Duration in seconds; `None` until metadata is known or for live sources.
    fn duration(&self) -> Option<f64>;

    fn ready_state(&self) -> ReadyState;

    fn set_volume(&self, volume: f64);

    fn volume(&self) -> f64;

    fn set_muted(&self, muted: bool);

    fn is_muted(&self) -> bool;

    fn set_playback_rate(&self, rate: f64);

    fn playback_rate(&self) -> f64 {
        1.0
    }
}
