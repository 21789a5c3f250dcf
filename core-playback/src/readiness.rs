//! # Load-Readiness Aggregator
//!
//! An engine can announce that a freshly loaded source is playable up to
//! three times (`loadedmetadata`, `canplay`, `canplaythrough`), or not at all
//! when the source was already buffered. The aggregator collapses those
//! signals plus a timeout fallback into exactly one [`ReadinessOutcome`] per
//! load attempt.
//!
//! ## Lifecycle
//!
//! 1. The adapter assigns a source and calls `load()` on the engine.
//! 2. [`ReadinessAggregator::register`] cancels the previous attempt, subscribes
//!    one listener per readiness kind and snapshots the engine's ready state.
//! 3. Engine events are fed through [`ReadinessAggregator::notify`].
//! 4. [`ReadinessWatch::wait`] settles once; the losing listeners are dropped.

use bridge_traits::{MediaEngine, MediaEvent};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::PlayerSettings;
use crate::race::{first_of, FirstOf};

/// Readiness signals fanned out to listeners.
const READINESS_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadinessKind {
    LoadedMetadata,
    CanPlay,
    CanPlayThrough,
}

impl ReadinessKind {
    pub const ALL: [ReadinessKind; 3] = [
        ReadinessKind::LoadedMetadata,
        ReadinessKind::CanPlay,
        ReadinessKind::CanPlayThrough,
    ];

    pub fn from_event(event: &MediaEvent) -> Option<Self> {
        match event {
            MediaEvent::LoadedMetadata => Some(ReadinessKind::LoadedMetadata),
            MediaEvent::CanPlay => Some(ReadinessKind::CanPlay),
            MediaEvent::CanPlayThrough => Some(ReadinessKind::CanPlayThrough),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReadinessKind::LoadedMetadata => "loadedmetadata",
            ReadinessKind::CanPlay => "canplay",
            ReadinessKind::CanPlayThrough => "canplaythrough",
        }
    }
}

/// How readiness was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyVia {
    Event(ReadinessKind),
    /// Engine already had metadata at registration
    AlreadyReady,
    /// No event arrived, but the engine had metadata when the timeout fired
    RecoveredAfterTimeout,
}

impl ReadyVia {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadyVia::Event(kind) => kind.as_str(),
            ReadyVia::AlreadyReady => "already-ready",
            ReadyVia::RecoveredAfterTimeout => "recovered-after-timeout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    Ready(ReadyVia),
    TimedOut,
    /// A newer load registered before this one settled
    Superseded,
}

impl ReadinessOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessOutcome::Ready(_))
    }
}

pub struct ReadinessAggregator {
    engine: Arc<dyn MediaEngine>,
    sender: broadcast::Sender<ReadinessKind>,
    current: Mutex<CancellationToken>,
    timeout: Duration,
    grace: Duration,
}

impl ReadinessAggregator {
    pub fn new(engine: Arc<dyn MediaEngine>, settings: &PlayerSettings) -> Self {
        let (sender, _) = broadcast::channel(READINESS_CHANNEL_CAPACITY);
        Self {
            engine,
            sender,
            current: Mutex::new(CancellationToken::new()),
            timeout: settings.readiness_timeout(),
            grace: settings.readiness_grace(),
        }
    }

    /// Forward an engine event; non-readiness events are ignored.
    pub fn notify(&self, event: &MediaEvent) {
        if let Some(kind) = ReadinessKind::from_event(event) {
            // No receivers just means nobody is waiting.
            let _ = self.sender.send(kind);
        }
    }

    /// Start watching a new load attempt, superseding the previous one.
    pub fn register(&self) -> ReadinessWatch {
        let token = CancellationToken::new();
        let previous = std::mem::replace(&mut *self.current.lock(), token.clone());
        previous.cancel();

        let listeners = ReadinessKind::ALL
            .iter()
            .map(|kind| (*kind, self.sender.subscribe()))
            .collect();

        let already_ready = self.engine.ready_state().has_metadata();
        debug!(already_ready, "Registered readiness watch");

        ReadinessWatch {
            engine: self.engine.clone(),
            listeners,
            token,
            already_ready,
            timeout: self.timeout,
            grace: self.grace,
        }
    }

    /// Supersede the current attempt without starting a new one.
    pub fn cancel(&self) {
        self.current.lock().cancel();
    }
}

impl std::fmt::Debug for ReadinessAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessAggregator")
            .field("timeout", &self.timeout)
            .field("grace", &self.grace)
            .finish()
    }
}

/// One load attempt's pending readiness.
pub struct ReadinessWatch {
    engine: Arc<dyn MediaEngine>,
    listeners: Vec<(ReadinessKind, broadcast::Receiver<ReadinessKind>)>,
    token: CancellationToken,
    already_ready: bool,
    timeout: Duration,
    grace: Duration,
}

impl ReadinessWatch {
    /// Token cancelled when a newer attempt registers.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn already_ready(&self) -> bool {
        self.already_ready
    }

    /// Settle this attempt. Resolves exactly once.
    pub async fn wait(self) -> ReadinessOutcome {
        let token = self.token.clone();
        tokio::select! {
            biased;
            _ = token.cancelled() => ReadinessOutcome::Superseded,
            outcome = self.settle() => outcome,
        }
    }

    /// Callback form of [`wait`](Self::wait): exactly one of `on_ready` and
    /// `on_timeout` runs, neither when superseded.
    pub async fn await_ready<R, T>(self, on_ready: R, on_timeout: T) -> ReadinessOutcome
    where
        R: FnOnce(ReadyVia),
        T: FnOnce(),
    {
        let outcome = self.wait().await;
        match outcome {
            ReadinessOutcome::Ready(via) => on_ready(via),
            ReadinessOutcome::TimedOut => on_timeout(),
            ReadinessOutcome::Superseded => {}
        }
        outcome
    }

    async fn settle(self) -> ReadinessOutcome {
        if self.already_ready {
            tokio::time::sleep(self.grace).await;
            return ReadinessOutcome::Ready(ReadyVia::AlreadyReady);
        }

        let signals: Vec<BoxFuture<'static, ReadinessKind>> = self
            .listeners
            .into_iter()
            .map(|(kind, receiver)| listen_for(kind, receiver).boxed())
            .collect();

        match first_of(signals, self.timeout).await {
            FirstOf::Signal { value, .. } => ReadinessOutcome::Ready(ReadyVia::Event(value)),
            FirstOf::TimedOut if self.engine.ready_state().has_metadata() => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "No readiness event before timeout, but engine has metadata"
                );
                ReadinessOutcome::Ready(ReadyVia::RecoveredAfterTimeout)
            }
            FirstOf::TimedOut => ReadinessOutcome::TimedOut,
        }
    }
}

async fn listen_for(kind: ReadinessKind, mut receiver: broadcast::Receiver<ReadinessKind>) -> ReadinessKind {
    loop {
        match receiver.recv().await {
            Ok(received) if received == kind => return kind,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => futures::future::pending::<()>().await,
        }
    }
}
