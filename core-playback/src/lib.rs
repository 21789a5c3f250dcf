//! # Playback Session Coordinator
//!
//! Keeps one piece of audio playing while the user moves between pages, and
//! resumes it correctly after a reload or a screen lock.
//!
//! ## Overview
//!
//! This crate handles:
//! - The persisted playback session and its TTL policy
//! - Collapsing redundant "media is ready" signals into one outcome per load
//! - Exactly-once advancement to the next chapter under concurrent triggers
//! - The single media engine: play, pause, seek, volume, error recovery
//! - Drag vs. tap handling for the floating mini-player
//!
//! ## Components
//!
//! ```text
//!                ┌────────────┐
//!  host events ─>│ PlayerCore │<─ now-playing actions
//!                └─────┬──────┘
//!          ┌───────────┼──────────────┐
//!          v           v              v
//!   ┌────────────┐ ┌──────────────┐ ┌────────┐
//!   │  Advance   │─>│Engine Adapter│ │ Widget │
//!   │Coordinator │ └──────┬───────┘ └───┬────┘
//!   └────────────┘        │             │
//!                  ┌──────┴──────┐ ┌────┴─────┐
//!                  │ Readiness / │ │ Position │
//!                  │SessionStore │ │  Store   │
//!                  └─────────────┘ └──────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlayerBridges, PlayerCore, PlayerSettings, TrackIdentity};
//!
//! let core = PlayerCore::new(bridges, PlayerSettings::default(), Default::default(), None)?;
//! core.restore().await;
//!
//! let chapter = TrackIdentity::new("book-1", "provider", "chapter-3");
//! core.play(chapter, None).await?;
//! ```

pub mod advance;
pub mod claim;
pub mod config;
pub mod engine;
pub mod error;
pub mod now_playing;
pub mod player;
pub mod position;
pub mod race;
pub mod readiness;
pub mod resolve;
pub mod session;
pub mod session_store;
pub mod widget;

#[cfg(test)]
pub(crate) mod test_support;

pub use advance::{
    AdvanceCoordinator, AdvanceOutcome, AdvanceState, AdvanceStep, AdvanceTrigger, PageKind,
    UrlSource,
};
pub use claim::TransitionClaim;
pub use config::PlayerSettings;
pub use engine::{EventDisposition, LoadPhase, PlayOutcome, PlaybackEngineAdapter};
pub use error::{ErrorKind, PlaybackError, Result};
pub use player::{PlayerBridges, PlayerCore, Restored};
pub use position::{DragBounds, PositionStore, Viewport, WidgetAnchor, WidgetPosition, WidgetSize};
pub use race::{first_of, FirstOf};
pub use readiness::{ReadinessAggregator, ReadinessKind, ReadinessOutcome, ReadinessWatch, ReadyVia};
pub use session::{PlaybackSession, SessionHandle, TrackIdentity};
pub use session_store::SessionStore;
pub use widget::{WidgetController, WidgetGesture};
