//! # Event Bus System
//!
//! Provides an event-driven architecture for the playback core using `tokio::sync::broadcast`.
//! Hosts subscribe to learn about session, playback and chapter changes without
//! polling the engine.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for each domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐    emit     ┌───────────┐
//! │ Session Store ├────────────>│           │
//! └───────────────┘             │           │
//!                               │ EventBus  │    subscribe   ┌────────────┐
//! ┌───────────────┐    emit     │ (broadcast├───────────────>│ Host UI    │
//! │ Engine Adapter├────────────>│  channel) │                └────────────┘
//! └───────────────┘             │           │
//! ┌───────────────┐    emit     │           │    subscribe   ┌────────────┐
//! │ Advance Coord.├────────────>│           ├───────────────>│ Analytics  │
//! └───────────────┘             └───────────┘                └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{ChapterEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Chapter(ChapterEvent::Advanced {
//!         book_id: "b1".to_string(),
//!         from_chapter_id: "c1".to_string(),
//!         to_chapter_id: "c2".to_string(),
//!         source: "prefetch".to_string(),
//!     }))
//!     .ok();
//!
//! let received = stream.recv().await.unwrap();
//! assert!(matches!(received, CoreEvent::Chapter(_)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Emitting with no subscribers returns an error that publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// `timeupdate` fires several times per second, so leave headroom for bursts.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Persisted session lifecycle
    Session(SessionEvent),
    /// Engine and load lifecycle
    Playback(PlaybackEvent),
    /// Chapter transitions
    Chapter(ChapterEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Chapter(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error {
                recoverable: false, ..
            }) => EventSeverity::Error,
            CoreEvent::Chapter(ChapterEvent::ResolutionFailed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::LoadTimedOut { .. }) => EventSeverity::Warning,
            CoreEvent::Chapter(ChapterEvent::Advanced { .. }) => EventSeverity::Info,
            CoreEvent::Session(SessionEvent::Restored { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Session Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A persisted session was found at startup.
    Restored {
        book_id: String,
        chapter_id: String,
        /// `false` when the stored URL was older than the TTL and dropped.
        url_kept: bool,
    },
    /// A new chapter identity was written to the session.
    TrackChanged { book_id: String, chapter_id: String },
    /// The session record was removed (explicit stop).
    Cleared,
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::Restored { .. } => "Session restored",
            SessionEvent::TrackChanged { .. } => "Session track changed",
            SessionEvent::Cleared => "Session cleared",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A new source was assigned and loading began.
    LoadStarted { chapter_id: String },
    /// The readiness aggregator settled for the current load.
    Ready {
        chapter_id: String,
        /// How readiness was detected (`loadedmetadata`, `already-ready`, ...).
        via: String,
    },
    /// The load produced no readiness signal in time.
    LoadTimedOut { chapter_id: String },
    Started { chapter_id: String },
    Resumed { chapter_id: String },
    Paused {
        chapter_id: String,
        position_ms: u64,
    },
    Stopped,
    /// A retry with a freshly resolved URL was scheduled.
    RetryScheduled { chapter_id: String, delay_ms: u64 },
    Error {
        chapter_id: Option<String>,
        kind: String,
        message: String,
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::LoadStarted { .. } => "Loading chapter audio",
            PlaybackEvent::Ready { .. } => "Chapter audio ready",
            PlaybackEvent::LoadTimedOut { .. } => "Chapter audio load timed out",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Stopped => "Playback stopped",
            PlaybackEvent::RetryScheduled { .. } => "Playback retry scheduled",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Chapter Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ChapterEvent {
    /// The coordinator began resolving a transition.
    AdvanceStarted {
        from_chapter_id: String,
        trigger: String,
    },
    /// Hand-off to the next (or previous) chapter completed.
    Advanced {
        book_id: String,
        from_chapter_id: String,
        to_chapter_id: String,
        /// Where the playable URL came from (`prefetch`, `legacy-slot`, `network`, `pre-resolved`).
        source: String,
    },
    /// Another component already claimed the transition.
    ClaimedElsewhere { chapter_id: String },
    /// The book has no chapter in the requested direction.
    EndOfBook { chapter_id: String },
    ResolutionFailed { chapter_id: String, message: String },
}

impl ChapterEvent {
    fn description(&self) -> &str {
        match self {
            ChapterEvent::AdvanceStarted { .. } => "Chapter transition started",
            ChapterEvent::Advanced { .. } => "Chapter transition completed",
            ChapterEvent::ClaimedElsewhere { .. } => "Chapter transition claimed elsewhere",
            ChapterEvent::EndOfBook { .. } => "No further chapter",
            ChapterEvent::ResolutionFailed { .. } => "Chapter resolution failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to core events.
///
/// Cloning is cheap; every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// When a subscriber falls behind by more than `capacity` events it
    /// receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let chapter_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Chapter(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
