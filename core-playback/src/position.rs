//! # Widget Position
//!
//! Where the floating mini-player sits, persisted independently of the
//! session under `globalPlayerPosition`.

use bridge_traits::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::config::PlayerSettings;

/// Wire shape: CSS-style offsets, only one pair set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
}

/// Which corner the widget is pinned to, in px from that corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetAnchor {
    TopLeft { left: f64, top: f64 },
    BottomRight { right: f64, bottom: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetSize {
    pub width: f64,
    pub height: f64,
}

impl WidgetSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Allowed top-left range for a widget in a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragBounds {
    pub margin: f64,
    pub min_left: f64,
    pub max_left: f64,
    pub min_top: f64,
    pub max_top: f64,
}

impl DragBounds {
    pub fn new(viewport: Viewport, size: WidgetSize, settings: &PlayerSettings) -> Self {
        let margin = settings.margin_for(viewport.width);
        let max_left = viewport.width - size.width - margin;
        let max_top = viewport.height - size.height - margin - settings.bottom_nav_reserve_px;
        Self {
            margin,
            min_left: margin,
            // A widget larger than the viewport pins to the margin.
            max_left: max_left.max(margin),
            min_top: margin,
            max_top: max_top.max(margin),
        }
    }

    pub fn clamp(&self, left: f64, top: f64) -> (f64, f64) {
        (
            left.clamp(self.min_left, self.max_left),
            top.clamp(self.min_top, self.max_top),
        )
    }

    pub fn contains(&self, left: f64, top: f64) -> bool {
        (self.min_left..=self.max_left).contains(&left) && (self.min_top..=self.max_top).contains(&top)
    }
}

impl WidgetAnchor {
    /// Default placement: bottom-right corner above the navigation bar.
    pub fn default_for(viewport: Viewport, settings: &PlayerSettings) -> Self {
        let margin = settings.margin_for(viewport.width);
        WidgetAnchor::BottomRight {
            right: margin,
            bottom: margin + settings.bottom_nav_reserve_px,
        }
    }

    /// Parse the wire shape. A complete `left`/`top` pair wins over `right`/`bottom`.
    pub fn from_wire(position: &WidgetPosition) -> Option<Self> {
        let finite = |v: Option<f64>| v.filter(|v| v.is_finite());
        match (
            finite(position.left),
            finite(position.top),
            finite(position.right),
            finite(position.bottom),
        ) {
            (Some(left), Some(top), _, _) => Some(WidgetAnchor::TopLeft { left, top }),
            (_, _, Some(right), Some(bottom)) => Some(WidgetAnchor::BottomRight { right, bottom }),
            _ => None,
        }
    }

    pub fn to_wire(self) -> WidgetPosition {
        match self {
            WidgetAnchor::TopLeft { left, top } => WidgetPosition {
                left: Some(left),
                top: Some(top),
                ..Default::default()
            },
            WidgetAnchor::BottomRight { right, bottom } => WidgetPosition {
                right: Some(right),
                bottom: Some(bottom),
                ..Default::default()
            },
        }
    }

    /// Top-left corner in viewport coordinates.
    pub fn top_left(self, viewport: Viewport, size: WidgetSize) -> (f64, f64) {
        match self {
            WidgetAnchor::TopLeft { left, top } => (left, top),
            WidgetAnchor::BottomRight { right, bottom } => (
                viewport.width - size.width - right,
                viewport.height - size.height - bottom,
            ),
        }
    }

    /// Clamp into `bounds`, keeping the anchor corner.
    pub fn clamp(self, viewport: Viewport, size: WidgetSize, bounds: &DragBounds) -> Self {
        let (left, top) = self.top_left(viewport, size);
        let (left, top) = bounds.clamp(left, top);
        match self {
            WidgetAnchor::TopLeft { .. } => WidgetAnchor::TopLeft { left, top },
            WidgetAnchor::BottomRight { .. } => WidgetAnchor::BottomRight {
                right: viewport.width - size.width - left,
                bottom: viewport.height - size.height - top,
            },
        }
    }
}

/// Persists the widget anchor.
pub struct PositionStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl PositionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, settings: &PlayerSettings) -> Self {
        Self {
            store,
            key: settings.position_key.clone(),
        }
    }

    pub async fn load(&self) -> Option<WidgetAnchor> {
        let raw = match self.store.get_string(&self.key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read widget position");
                return None;
            }
        };

        match serde_json::from_str::<WidgetPosition>(&raw) {
            Ok(position) => WidgetAnchor::from_wire(&position),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Ignoring malformed widget position");
                None
            }
        }
    }

    pub async fn save(&self, anchor: WidgetAnchor) {
        let json = match serde_json::to_string(&anchor.to_wire()) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize widget position");
                return;
            }
        };

        if let Err(e) = self.store.set_string(&self.key, &json).await {
            warn!(key = %self.key, error = %e, "Failed to persist widget position");
        }
    }
}
