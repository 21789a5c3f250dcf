//! # Playback Error Types
//!
//! Error taxonomy for the playback coordinator. Engine failures are
//! classified once, where they originate, into an [`ErrorKind`]; the policy
//! (swallow, retry once, notify) is decided from the kind alone.

use bridge_traits::{BridgeError, MediaErrorCode};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Classified failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No readiness signal within the load timeout
    LoadTimeout,
    NetworkError,
    DecodeError,
    /// Source format or URL unusable
    FormatUnsupported,
    /// Fetch aborted, typically because a newer load replaced it
    AbortedByUser,
    /// `play()` blocked by autoplay policy
    NotAllowed,
    /// End of book
    NoNextChapter,
    /// Chapter context or playable URL lookup failed
    ResolutionFailed,
}

impl ErrorKind {
    /// Benign kinds are logged at debug and never surfaced.
    pub fn is_benign(self) -> bool {
        matches!(self, ErrorKind::AbortedByUser)
    }

    /// Kinds that warrant one re-resolution of the playable URL.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::NetworkError | ErrorKind::DecodeError)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::LoadTimeout => "LoadTimeout",
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::DecodeError => "DecodeError",
            ErrorKind::FormatUnsupported => "FormatUnsupported",
            ErrorKind::AbortedByUser => "AbortedByUser",
            ErrorKind::NotAllowed => "NotAllowed",
            ErrorKind::NoNextChapter => "NoNextChapter",
            ErrorKind::ResolutionFailed => "ResolutionFailed",
        }
    }

    /// Text shown to the user when this kind surfaces as a notice.
    pub fn user_message(self) -> Option<&'static str> {
        match self {
            ErrorKind::LoadTimeout => Some("Loading the chapter audio is taking too long."),
            ErrorKind::NetworkError => Some("Network error while playing. Please try again."),
            ErrorKind::DecodeError => Some("This chapter's audio could not be played."),
            ErrorKind::FormatUnsupported => Some("This chapter's audio format is not supported."),
            ErrorKind::NotAllowed => Some("Tap play to start listening."),
            ErrorKind::ResolutionFailed => Some("Could not load the chapter. Please try again."),
            ErrorKind::AbortedByUser | ErrorKind::NoNextChapter => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MediaErrorCode> for ErrorKind {
    fn from(code: MediaErrorCode) -> Self {
        match code {
            MediaErrorCode::Aborted => ErrorKind::AbortedByUser,
            MediaErrorCode::Network => ErrorKind::NetworkError,
            MediaErrorCode::Decode => ErrorKind::DecodeError,
            MediaErrorCode::SrcNotSupported => ErrorKind::FormatUnsupported,
            MediaErrorCode::NotAllowed => ErrorKind::NotAllowed,
        }
    }
}

/// Errors returned by playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Chapter audio did not become ready within {0:?}")]
    LoadTimeout(Duration),

    #[error("Media engine error ({kind}): {message}")]
    Engine { kind: ErrorKind, message: String },

    #[error("No chapter after {0}")]
    NoNextChapter(String),

    #[error("No chapter before {0}")]
    NoPreviousChapter(String),

    #[error("Failed to resolve chapter {chapter_id}: {source}")]
    Resolution {
        chapter_id: String,
        #[source]
        source: BridgeError,
    },

    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f64),

    #[error("Invalid playback rate: {0}")]
    InvalidPlaybackRate(f64),

    #[error("Invalid seek position: {0}")]
    InvalidSeek(f64),

    #[error("No active playback session")]
    NoActiveSession,

    #[error("Invalid player settings: {0}")]
    InvalidSettings(String),
}

impl PlaybackError {
    /// Classified kind, when the error belongs to the playback taxonomy.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            PlaybackError::LoadTimeout(_) => Some(ErrorKind::LoadTimeout),
            PlaybackError::Engine { kind, .. } => Some(*kind),
            PlaybackError::NoNextChapter(_) | PlaybackError::NoPreviousChapter(_) => {
                Some(ErrorKind::NoNextChapter)
            }
            PlaybackError::Resolution { .. } => Some(ErrorKind::ResolutionFailed),
            _ => None,
        }
    }

    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::LoadTimeout(_) => true,
            PlaybackError::Engine { kind, .. } => kind.is_retryable(),
            PlaybackError::Resolution { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
