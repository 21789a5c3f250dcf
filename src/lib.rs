//! Workspace umbrella crate.
//!
//! Host applications depend on `audiobook-player-workspace` and pick a feature:
//! `desktop-shims` wires the native bridge defaults through `core-service`,
//! `headless` exposes the bare core for hosts that inject every bridge
//! themselves.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;

#[cfg(all(feature = "headless", not(feature = "desktop-shims")))]
pub use core_playback::*;
