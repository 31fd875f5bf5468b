//! View state (zoom and pan) and the transforms derived from it.

use eframe::egui::{Pos2, Rect, Vec2};

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f32 = 0.5;
/// Largest allowed zoom factor.
pub const MAX_ZOOM: f32 = 20.0;

/// Uniform scale followed by a translation: `p -> p * scale + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub scale: f32,
    pub translation: Vec2,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        scale: 1.0,
        translation: Vec2::ZERO,
    };

    pub fn translate(offset: Vec2) -> Self {
        Self {
            scale: 1.0,
            translation: offset,
        }
    }

    pub fn scale(factor: f32) -> Self {
        Self {
            scale: factor,
            translation: Vec2::ZERO,
        }
    }

    /// Returns the transform that applies `inner` first, then `self`.
    pub fn compose(self, inner: Affine) -> Affine {
        Affine {
            scale: self.scale * inner.scale,
            translation: self.translation + inner.translation * self.scale,
        }
    }

    pub fn apply(&self, p: Pos2) -> Pos2 {
        Pos2::new(
            p.x * self.scale + self.translation.x,
            p.y * self.scale + self.translation.y,
        )
    }

    pub fn invert(&self, p: Pos2) -> Pos2 {
        Pos2::new(
            (p.x - self.translation.x) / self.scale,
            (p.y - self.translation.y) / self.scale,
        )
    }
}

/// Zoom and pan of the simulated map.
///
/// Mutated only through the interaction controller; read by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Current zoom factor, always within [`MIN_ZOOM`, `MAX_ZOOM`]
    pub zoom: f32,
    /// Pan offset in logical canvas pixels
    pub pan_offset: Vec2,
    /// Whether a drag gesture is in progress
    pub dragging: bool,
    /// Last pointer position seen during a drag (logical pixels)
    pub last_pointer: Pos2,
    /// Logical canvas size
    pub canvas_size: Vec2,
}

impl ViewState {
    pub fn new(canvas_size: Vec2) -> Self {
        Self {
            zoom: 1.0,
            pan_offset: Vec2::ZERO,
            dragging: false,
            last_pointer: Pos2::ZERO,
            canvas_size,
        }
    }

    pub fn center(&self) -> Pos2 {
        (self.canvas_size / 2.0).to_pos2()
    }

    /// Multiplies the zoom by `scale_factor` while keeping the logical point
    /// under `anchor` (logical canvas pixels) fixed on screen.
    ///
    /// The pan offset is updated with the ratio actually applied after
    /// clamping, so a zoom stuck at a bound leaves the view untouched.
    pub fn apply_zoom(&mut self, scale_factor: f32, anchor: Pos2) {
        if !scale_factor.is_finite() || scale_factor <= 0.0 {
            log::warn!("Ignoring invalid zoom factor {}", scale_factor);
            return;
        }

        let old_zoom = self.zoom;
        let new_zoom = (old_zoom * scale_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let ratio = new_zoom / old_zoom;

        let anchor_rel = anchor - self.center();
        self.pan_offset = anchor_rel * (1.0 - ratio) + self.pan_offset * ratio;
        self.zoom = new_zoom;
    }

    /// Pans by a pointer delta, scaled down by the current zoom.
    pub fn apply_pan(&mut self, delta: Vec2) {
        self.pan_offset += delta / self.zoom;
    }

    /// Restores the initial zoom and offset.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan_offset = Vec2::ZERO;
        self.dragging = false;
    }

    /// The map transform: translate to center + offset, scale by zoom,
    /// translate back by half the canvas.
    pub fn canvas_transform(&self) -> Affine {
        let center = self.center().to_vec2();
        Affine::translate(center + self.pan_offset)
            .compose(Affine::scale(self.zoom))
            .compose(Affine::translate(-center))
    }

    /// Maps a screen position inside the displayed canvas rect to logical
    /// canvas pixels. The canvas may be displayed at any size.
    pub fn screen_to_logical(&self, pos: Pos2, display_rect: Rect) -> Pos2 {
        let sx = self.canvas_size.x / display_rect.width().max(1.0);
        let sy = self.canvas_size.y / display_rect.height().max(1.0);
        Pos2::new(
            (pos.x - display_rect.min.x) * sx,
            (pos.y - display_rect.min.y) * sy,
        )
    }
}
