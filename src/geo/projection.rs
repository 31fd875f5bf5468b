//! Map projection from geographic coordinates to logical canvas pixels.
//!
//! The simulated map uses a plain equirectangular projection: longitude and
//! latitude map linearly onto x and y across the whole logical canvas. The
//! distortion near the poles and the seam at the antimeridian are accepted.

use eframe::egui::{Pos2, Vec2};
use geo_types::Coord;

/// Equirectangular projection onto a fixed logical canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    /// Logical canvas width in pixels
    pub width: f64,
    /// Logical canvas height in pixels
    pub height: f64,
}

impl Projector {
    /// Creates a projector for a logical canvas of the given size.
    pub fn new(size: Vec2) -> Self {
        Self {
            width: size.x as f64,
            height: size.y as f64,
        }
    }

    /// Projects a latitude/longitude pair (degrees) to logical canvas pixels.
    pub fn project(&self, lat: f64, lng: f64) -> Pos2 {
        let x = (lng + 180.0) / 360.0 * self.width;
        let y = (90.0 - lat) / 180.0 * self.height;
        Pos2::new(x as f32, y as f32)
    }

    /// Projects a `(lon, lat)` coordinate as stored in geography rings.
    pub fn project_coord(&self, coord: Coord<f64>) -> Pos2 {
        self.project(coord.y, coord.x)
    }
}
