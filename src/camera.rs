//! Camera state: where the view is centred, how far in, which way round
//!
//! Pan deltas arrive in screen pixels and are divided by the scale before
//! they move the focus. Zoom doubles or halves within fixed limits.

use crate::location::{clamp_pan_delta, tile_focus, MapBounds, Orientation, ScreenPoint};

pub const MIN_SCALE: f64 = 0.25;
pub const MAX_SCALE: f64 = 4.0;
pub const ZOOM_STEP: f64 = 2.0;

/// Something observable changed about the camera
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraEvent {
    Zoomed { scale: f64 },
    Rotated { orientation: Orientation },
    Moved { focus: ScreenPoint },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub orientation: Orientation,
    pub scale: f64,
    /// Point in projected space drawn at the centre of the canvas
    pub focus: ScreenPoint,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Camera {
    pub fn new(scale: f64) -> Self {
        Self {
            orientation: Orientation::R0,
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
            focus: ScreenPoint::default(),
        }
    }

    /// Step the zoom. `None` when the scale is already at the limit.
    pub fn zoom(&mut self, zoom_in: bool) -> Option<CameraEvent> {
        let target = if zoom_in {
            (self.scale * ZOOM_STEP).min(MAX_SCALE)
        } else {
            (self.scale / ZOOM_STEP).max(MIN_SCALE)
        };
        if target == self.scale {
            return None;
        }
        self.scale = target;
        Some(CameraEvent::Zoomed { scale: target })
    }

    /// Where the focus would land after a drag, clamped to the map.
    pub fn panned(&self, bounds: &MapBounds, delta: ScreenPoint) -> ScreenPoint {
        clamp_pan_delta(self.orientation, bounds, self.focus, delta, self.scale)
    }

    /// Move the focus by a drag delta.
    pub fn pan(&mut self, bounds: &MapBounds, delta: ScreenPoint) -> Option<CameraEvent> {
        let focus = self.panned(bounds, delta);
        if focus == self.focus {
            return None;
        }
        self.focus = focus;
        Some(CameraEvent::Moved { focus })
    }

    /// Centre the view on a tile under the current rotation.
    pub fn goto_tile(&mut self, bounds: &MapBounds, tx: f64, ty: f64) -> CameraEvent {
        self.focus = tile_focus(self.orientation, bounds, tx, ty);
        CameraEvent::Moved { focus: self.focus }
    }
}
