//! # Player Settings
//!
//! Tuning knobs for the coordinator. All fields have serde defaults so hosts
//! can ship a partial JSON document.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, Result};

/// Playback coordinator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Age after which a persisted session's audio URL is discarded.
    ///
    /// Default: 1 hour.
    #[serde(default = "default_session_ttl_ms")]
    pub session_ttl_ms: u64,

    /// Maximum wait for a readiness signal after a load.
    ///
    /// Default: 5000 ms.
    #[serde(default = "default_readiness_timeout_ms")]
    pub readiness_timeout_ms: u64,

    /// Delay before reporting ready when the engine was already ready at registration.
    ///
    /// Default: 200 ms.
    #[serde(default = "default_readiness_grace_ms")]
    pub readiness_grace_ms: u64,

    /// Delay before the single re-resolution after a network or decode error.
    ///
    /// Default: 1500 ms.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Step used by `seekforward`/`seekbackward` when the host gives no offset.
    ///
    /// Default: 10 s.
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,

    /// Pointer travel that turns a press into a drag.
    ///
    /// Default: 5 px.
    #[serde(default = "default_drag_threshold_px")]
    pub drag_threshold_px: f64,

    /// Viewports at or below this width use the narrow margin.
    ///
    /// Default: 480 px.
    #[serde(default = "default_narrow_viewport_px")]
    pub narrow_viewport_px: f64,

    #[serde(default = "default_narrow_margin_px")]
    pub narrow_margin_px: f64,

    #[serde(default = "default_wide_margin_px")]
    pub wide_margin_px: f64,

    /// Height kept free at the bottom for the navigation bar.
    ///
    /// Default: 60 px.
    #[serde(default = "default_bottom_nav_reserve_px")]
    pub bottom_nav_reserve_px: f64,

    /// Chapter contexts kept in memory.
    #[serde(default = "default_context_cache_size")]
    pub context_cache_size: usize,

    #[serde(default = "default_session_key")]
    pub session_key: String,

    #[serde(default = "default_position_key")]
    pub position_key: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            session_ttl_ms: default_session_ttl_ms(),
            readiness_timeout_ms: default_readiness_timeout_ms(),
            readiness_grace_ms: default_readiness_grace_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            seek_step_secs: default_seek_step_secs(),
            drag_threshold_px: default_drag_threshold_px(),
            narrow_viewport_px: default_narrow_viewport_px(),
            narrow_margin_px: default_narrow_margin_px(),
            wide_margin_px: default_wide_margin_px(),
            bottom_nav_reserve_px: default_bottom_nav_reserve_px(),
            context_cache_size: default_context_cache_size(),
            session_key: default_session_key(),
            position_key: default_position_key(),
        }
    }
}

impl PlayerSettings {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_millis(self.session_ttl_ms)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn readiness_grace(&self) -> Duration {
        Duration::from_millis(self.readiness_grace_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Edge margin for a viewport of the given width.
    pub fn margin_for(&self, viewport_width: f64) -> f64 {
        if viewport_width <= self.narrow_viewport_px {
            self.narrow_margin_px
        } else {
            self.wide_margin_px
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.readiness_timeout_ms == 0 {
            return Err(PlaybackError::InvalidSettings(
                "readiness_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.readiness_grace_ms >= self.readiness_timeout_ms {
            return Err(PlaybackError::InvalidSettings(
                "readiness_grace_ms must be shorter than readiness_timeout_ms".to_string(),
            ));
        }

        if self.session_ttl_ms == 0 {
            return Err(PlaybackError::InvalidSettings(
                "session_ttl_ms must be > 0".to_string(),
            ));
        }

        if !(self.seek_step_secs.is_finite() && self.seek_step_secs > 0.0) {
            return Err(PlaybackError::InvalidSettings(
                "seek_step_secs must be a positive number".to_string(),
            ));
        }

        for (name, value) in [
            ("drag_threshold_px", self.drag_threshold_px),
            ("narrow_margin_px", self.narrow_margin_px),
            ("wide_margin_px", self.wide_margin_px),
            ("bottom_nav_reserve_px", self.bottom_nav_reserve_px),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PlaybackError::InvalidSettings(format!(
                    "{} must be a non-negative number",
                    name
                )));
            }
        }

        if self.context_cache_size == 0 {
            return Err(PlaybackError::InvalidSettings(
                "context_cache_size must be > 0".to_string(),
            ));
        }

        if self.session_key.is_empty() || self.position_key.is_empty() {
            return Err(PlaybackError::InvalidSettings(
                "storage keys cannot be empty".to_string(),
            ));
        }

        if self.session_key == self.position_key {
            return Err(PlaybackError::InvalidSettings(
                "session and position keys must differ".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_session_ttl_ms() -> u64 {
    60 * 60 * 1000
}

fn default_readiness_timeout_ms() -> u64 {
    5000
}

fn default_readiness_grace_ms() -> u64 {
    200
}

fn default_retry_delay_ms() -> u64 {
    1500
}

fn default_seek_step_secs() -> f64 {
    10.0
}

fn default_drag_threshold_px() -> f64 {
    5.0
}

fn default_narrow_viewport_px() -> f64 {
    480.0
}

fn default_narrow_margin_px() -> f64 {
    8.0
}

fn default_wide_margin_px() -> f64 {
    12.0
}

fn default_bottom_nav_reserve_px() -> f64 {
    60.0
}

fn default_context_cache_size() -> usize {
    32
}

fn default_session_key() -> String {
    "globalPlayerState".to_string()
}

fn default_position_key() -> String {
    "globalPlayerPosition".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.session_ttl(), Duration::from_secs(3600));
        assert_eq!(settings.readiness_timeout(), Duration::from_millis(5000));
        assert_eq!(settings.readiness_grace(), Duration::from_millis(200));
        assert_eq!(settings.session_key, "globalPlayerState");
        assert_eq!(settings.position_key, "globalPlayerPosition");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn margin_switches_above_breakpoint() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.margin_for(320.0), 8.0);
        assert_eq!(settings.margin_for(480.0), 8.0);
        assert_eq!(settings.margin_for(481.0), 12.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: PlayerSettings =
            serde_json::from_str(r#"{"retry_delay_ms": 250, "wide_margin_px": 16}"#).unwrap();
        assert_eq!(settings.retry_delay(), Duration::from_millis(250));
        assert_eq!(settings.wide_margin_px, 16.0);
        assert_eq!(settings.readiness_timeout_ms, 5000);
    }

    #[test]
    fn validate_rejects_inconsistent_values() {
        let settings = PlayerSettings {
            readiness_grace_ms: 6000,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = PlayerSettings {
            position_key: "globalPlayerState".into(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = PlayerSettings {
            narrow_margin_px: f64::NAN,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
