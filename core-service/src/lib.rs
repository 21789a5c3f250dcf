//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (media engine,
//! key-value storage, chapter API, now-playing surface) into the playback
//! core and restores the persisted session. Desktop hosts typically enable
//! the `desktop-shims` feature, which fills every bridge except the media
//! engine with the defaults from `bridge-desktop`.

pub mod error;

pub use error::{CoreError, Result};

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub use bridge_desktop;

pub use core_playback::{
    AdvanceOutcome, AdvanceTrigger, PageKind, PlayOutcome, PlaybackSession, PlayerCore,
    PlayerSettings, Restored, TrackIdentity,
};
pub use core_runtime::config::{CoreConfig, FeatureFlags};
pub use core_runtime::logging::{init_logging, LoggingConfig};

use bridge_traits::{MediaAction, MediaEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct PlayerService {
    core: Arc<PlayerCore>,
}

impl PlayerService {
    /// Wrap an already constructed core.
    pub fn new(core: Arc<PlayerCore>) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &Arc<PlayerCore> {
        &self.core
    }

    /// Forward engine events from `events` until the sender is dropped.
    ///
    /// `ended` advances run on their own tasks, so the pump keeps delivering
    /// readiness events for the next chapter while an advance is in flight.
    pub fn attach_engine_events(&self, mut events: mpsc::UnboundedReceiver<MediaEvent>) -> JoinHandle<()> {
        let core = Arc::clone(&self.core);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Some(advance) = core.handle_event(event).await {
                    tokio::spawn(async move {
                        if let Ok(outcome) = advance.await {
                            debug!(?outcome, "Chapter end handled");
                        }
                    });
                }
            }
            debug!("Engine event stream closed");
        })
    }

    /// Forward now-playing actions from `actions` until the sender is dropped.
    pub fn attach_actions(&self, mut actions: mpsc::UnboundedReceiver<MediaAction>) -> JoinHandle<()> {
        let core = Arc::clone(&self.core);
        tokio::spawn(async move {
            while let Some(action) = actions.recv().await {
                // Each action runs on its own task inside the core.
                drop(core.handle_action(action));
            }
            debug!("Now-playing action stream closed");
        })
    }
}

impl std::fmt::Debug for PlayerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerService").field("core", &self.core).finish()
    }
}

/// Build the core from a validated configuration and restore the persisted
/// session, if any.
///
/// ```ignore
/// let config = CoreConfig::builder()
///     .media_engine(engine)
///     .storage_path("data/player.db")
///     .api_base_url("https://books.example")
///     .build()?;
/// let (service, restored) = core_service::bootstrap(config, PlayerSettings::default()).await?;
/// ```
pub async fn bootstrap(
    config: CoreConfig,
    settings: PlayerSettings,
) -> Result<(PlayerService, Option<Restored>)> {
    let core = PlayerCore::from_config(&config, settings)?;
    let restored = core.restore().await;

    info!(
        restored = restored.is_some(),
        chapter_id = restored.as_ref().map(|r| r.session.chapter_id.as_str()),
        "Player service ready"
    );

    Ok((PlayerService::new(core), restored))
}

/// Desktop bootstrap: every bridge but the engine comes from `bridge-desktop`.
///
/// Must be called from within a Tokio runtime.
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(
    engine: Arc<dyn bridge_traits::MediaEngine>,
    storage_path: impl Into<std::path::PathBuf>,
    api_base_url: impl Into<String>,
    settings: PlayerSettings,
) -> Result<(PlayerService, Option<Restored>)> {
    let storage_path = storage_path.into();
    let api_base_url = api_base_url.into();

    let config = tokio::task::spawn_blocking(move || {
        CoreConfig::builder()
            .media_engine(engine)
            .storage_path(storage_path)
            .api_base_url(api_base_url)
            .build()
    })
    .await
    .map_err(|e| CoreError::InitializationFailed(e.to_string()))??;

    bootstrap(config, settings).await
}
