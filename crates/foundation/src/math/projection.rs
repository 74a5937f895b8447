//! World ↔ canvas ↔ screen mappings.
//!
//! Two independent stages:
//! - `CanvasProjection`: world units to canvas pixels. Depends only on `WorldBounds`
//!   and the canvas size, so it is rebuilt per draw but never changes with pan/zoom.
//! - `ViewTransform`: canvas pixels to screen pixels (`screen = canvas * scale + offset`).
//!   Owned by the pan/zoom collaborator and mirrored here read-only.

use super::Vec2;
use crate::bounds::WorldBounds;

/// Pixel size of the drawing surface before pan/zoom.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CanvasProjection {
    bounds: WorldBounds,
    canvas: CanvasSize,
}

impl CanvasProjection {
    /// Returns `None` when the bounds are degenerate or the canvas has no area.
    pub fn new(bounds: WorldBounds, canvas: CanvasSize) -> Option<Self> {
        if bounds.is_degenerate() || canvas.is_empty() {
            return None;
        }
        Some(Self { bounds, canvas })
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Canvas Y is flipped: world `max_y` maps to canvas row 0.
    pub fn world_to_canvas(&self, world: Vec2) -> Vec2 {
        let b = &self.bounds;
        let cx = (world.x - b.min_x) / b.span_x() * self.canvas.width;
        let cy = self.canvas.height - (world.y - b.min_y) / b.span_y() * self.canvas.height;
        Vec2::new(cx, cy)
    }

    pub fn canvas_to_world(&self, canvas: Vec2) -> Vec2 {
        let b = &self.bounds;
        let x = b.min_x + canvas.x / self.canvas.width * b.span_x();
        let y = b.min_y + (self.canvas.height - canvas.y) / self.canvas.height * b.span_y();
        Vec2::new(x, y)
    }

    /// Converts a world-space length along X into canvas pixels.
    pub fn world_len_to_canvas(&self, len: f64) -> f64 {
        len / self.bounds.span_x() * self.canvas.width
    }
}

/// Live pan/zoom transform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ViewTransform {
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Positive finite scale and finite offsets.
    pub fn is_valid(&self) -> bool {
        self.scale.is_finite()
            && self.scale > 0.0
            && self.offset_x.is_finite()
            && self.offset_y.is_finite()
    }

    pub fn canvas_to_screen(&self, canvas: Vec2) -> Vec2 {
        Vec2::new(
            canvas.x * self.scale + self.offset_x,
            canvas.y * self.scale + self.offset_y,
        )
    }

    /// Inverse of `canvas_to_screen`; `None` for a zero or non-finite scale.
    pub fn screen_to_canvas(&self, screen: Vec2) -> Option<Vec2> {
        if self.scale == 0.0 || !self.scale.is_finite() {
            return None;
        }
        Some(Vec2::new(
            (screen.x - self.offset_x) / self.scale,
            (screen.y - self.offset_y) / self.scale,
        ))
    }

    /// Canvas point currently shown at the centre of a `screen`-sized viewport.
    pub fn viewport_centre(&self, screen: CanvasSize) -> Option<Vec2> {
        self.screen_to_canvas(Vec2::new(screen.width / 2.0, screen.height / 2.0))
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}
