//! # Widget Interaction Handler
//!
//! Tells a drag of the floating mini-player apart from a tap on it. A press
//! that travels more than the drag threshold moves the widget, clamped to the
//! viewport on every step; anything shorter is a tap that opens the player
//! page for the current chapter.

use parking_lot::Mutex;
use tracing::debug;

use crate::config::PlayerSettings;
use crate::position::{DragBounds, PositionStore, Viewport, WidgetAnchor, WidgetSize};
use crate::session::SessionHandle;

/// Result of releasing the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetGesture {
    /// Tap: open this route
    Navigate(String),
    /// Drag finished at this (persisted) anchor
    Dragged(WidgetAnchor),
    /// Nothing to do (no press, or a tap with no active session)
    None,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    start: (f64, f64),
    origin: (f64, f64),
    last: (f64, f64),
    viewport: Viewport,
    size: WidgetSize,
    dragging: bool,
}

pub struct WidgetController {
    positions: PositionStore,
    session: SessionHandle,
    settings: PlayerSettings,
    press: Mutex<Option<Press>>,
}

impl WidgetController {
    pub(crate) fn new(positions: PositionStore, session: SessionHandle, settings: PlayerSettings) -> Self {
        Self {
            positions,
            session,
            settings,
            press: Mutex::new(None),
        }
    }

    /// Persisted anchor clamped to `viewport`, or the default bottom-right
    /// placement. A clamped anchor is written back.
    pub async fn load(&self, viewport: Viewport, size: WidgetSize) -> WidgetAnchor {
        match self.positions.load().await {
            Some(anchor) => self.fit(anchor, viewport, size).await,
            None => WidgetAnchor::default_for(viewport, &self.settings),
        }
    }

    pub fn pointer_down(&self, x: f64, y: f64, current: WidgetAnchor, viewport: Viewport, size: WidgetSize) {
        let origin = current.top_left(viewport, size);
        *self.press.lock() = Some(Press {
            start: (x, y),
            origin,
            last: origin,
            viewport,
            size,
            dragging: false,
        });
    }

    /// Track the pointer. Returns the widget's new anchor while dragging.
    pub fn pointer_move(&self, x: f64, y: f64) -> Option<WidgetAnchor> {
        let mut guard = self.press.lock();
        let press = guard.as_mut()?;
        self.step(press, x, y)
    }

    fn step(&self, press: &mut Press, x: f64, y: f64) -> Option<WidgetAnchor> {
        let dx = x - press.start.0;
        let dy = y - press.start.1;

        if !press.dragging && dx.hypot(dy) > self.settings.drag_threshold_px {
            press.dragging = true;
        }
        if !press.dragging {
            return None;
        }

        let bounds = DragBounds::new(press.viewport, press.size, &self.settings);
        let (left, top) = bounds.clamp(press.origin.0 + dx, press.origin.1 + dy);
        press.last = (left, top);
        Some(WidgetAnchor::TopLeft { left, top })
    }

    pub async fn pointer_up(&self, x: f64, y: f64) -> WidgetGesture {
        let press = {
            let mut guard = self.press.lock();
            let Some(mut press) = guard.take() else {
                return WidgetGesture::None;
            };
            self.step(&mut press, x, y);
            press
        };

        if press.dragging {
            let anchor = WidgetAnchor::TopLeft {
                left: press.last.0,
                top: press.last.1,
            };
            self.positions.save(anchor).await;
            debug!(left = press.last.0, top = press.last.1, "Widget moved");
            return WidgetGesture::Dragged(anchor);
        }

        match self.session.identity() {
            Some(identity) => WidgetGesture::Navigate(identity.player_route()),
            None => WidgetGesture::None,
        }
    }

    pub fn pointer_cancel(&self) {
        self.press.lock().take();
    }

    pub fn is_dragging(&self) -> bool {
        self.press.lock().is_some_and(|p| p.dragging)
    }

    /// Re-clamp the persisted anchor for a new viewport, re-persisting it
    /// when it had fallen out of bounds.
    pub async fn on_viewport_resize(&self, viewport: Viewport, size: WidgetSize) -> Option<WidgetAnchor> {
        let anchor = self.positions.load().await?;
        Some(self.fit(anchor, viewport, size).await)
    }

    async fn fit(&self, anchor: WidgetAnchor, viewport: Viewport, size: WidgetSize) -> WidgetAnchor {
        let bounds = DragBounds::new(viewport, size, &self.settings);
        let (left, top) = anchor.top_left(viewport, size);
        if bounds.contains(left, top) {
            return anchor;
        }

        let clamped = anchor.clamp(viewport, size, &bounds);
        debug!(?anchor, ?clamped, "Re-clamping widget to viewport");
        self.positions.save(clamped).await;
        clamped
    }
}

impl std::fmt::Debug for WidgetController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetController")
            .field("press", &*self.press.lock())
            .finish()
    }
}
