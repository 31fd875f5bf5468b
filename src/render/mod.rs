//! Scene rendering onto abstract drawing surfaces.
//!
//! The renderer only talks to the [`Surface`] trait, so the same scene can be
//! rasterised for display or export, or recorded for inspection.

pub mod colors;
#[cfg(test)]
mod display_list;
mod raster;
mod scene;
pub mod text;

#[cfg(test)]
pub use display_list::{DisplayList, DrawCommand};
pub use raster::RasterSurface;
pub use scene::render_scene;

use crate::map::Affine;
use eframe::egui::{Color32, Pos2, Rect, Stroke, Vec2};

/// A 2D drawing target with a single current transform.
///
/// Coordinates passed to the drawing calls are logical canvas pixels; the
/// current transform maps them onto the surface.
pub trait Surface {
    /// Logical size of the drawable area.
    fn logical_size(&self) -> Vec2;

    /// Erases everything to transparent and resets the transform.
    fn clear(&mut self);

    /// Replaces the current transform.
    fn set_transform(&mut self, transform: Affine);

    fn fill_rect(&mut self, rect: Rect, color: Color32);

    /// Fills a closed ring and strokes its outline.
    fn polygon(&mut self, ring: &[Pos2], fill: Color32, stroke: Stroke);

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke);

    /// Strokes an open path through the given points.
    fn polyline(&mut self, points: &[Pos2], stroke: Stroke);

    /// Draws text centered on `center`, `size` in logical pixels.
    fn text(&mut self, center: Pos2, text: &str, size: f32, color: Color32);
}
