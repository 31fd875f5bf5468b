//! Software raster surface backed by a `tiny_skia::Pixmap`.

use super::{text, Surface};
use crate::map::Affine;
use eframe::egui::{self, Color32, Pos2, Rect, Stroke, Vec2};
use tiny_skia as sk;

/// A pixmap sized `logical_size * pixel_ratio`.
///
/// The display canvas uses a ratio of 1; exports render at 2.
#[derive(Clone)]
pub struct RasterSurface {
    pixmap: sk::Pixmap,
    logical_size: Vec2,
    pixel_ratio: f32,
    transform: Affine,
}

impl RasterSurface {
    /// Allocates a surface. Returns `None` for an empty size.
    pub fn new(logical_size: Vec2, pixel_ratio: f32) -> Option<Self> {
        let width = (logical_size.x * pixel_ratio).round();
        let height = (logical_size.y * pixel_ratio).round();
        if width < 1.0 || height < 1.0 || !width.is_finite() || !height.is_finite() {
            return None;
        }
        let pixmap = sk::Pixmap::new(width as u32, height as u32)?;
        Some(Self {
            pixmap,
            logical_size,
            pixel_ratio,
            transform: Affine::IDENTITY,
        })
    }

    /// Returns true if this surface already matches the requested geometry.
    pub fn matches(&self, logical_size: Vec2, pixel_ratio: f32) -> bool {
        self.logical_size == logical_size && self.pixel_ratio == pixel_ratio
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn pixmap(&self) -> &sk::Pixmap {
        &self.pixmap
    }

    /// Copies the pixels into an egui image for texture upload.
    pub fn to_color_image(&self) -> egui::ColorImage {
        egui::ColorImage::from_rgba_premultiplied(
            [self.pixmap.width() as usize, self.pixmap.height() as usize],
            self.pixmap.data(),
        )
    }

    /// Current transform including the device pixel ratio.
    fn device_transform(&self) -> sk::Transform {
        let scale = self.transform.scale * self.pixel_ratio;
        let t = self.transform.translation * self.pixel_ratio;
        sk::Transform::from_row(scale, 0.0, 0.0, scale, t.x, t.y)
    }

    fn to_device(&self, p: Pos2) -> Pos2 {
        let p = self.transform.apply(p);
        Pos2::new(p.x * self.pixel_ratio, p.y * self.pixel_ratio)
    }

    fn fill(&mut self, path: &sk::Path, color: Color32) {
        let paint = paint(color);
        let ts = self.device_transform();
        self.pixmap
            .fill_path(path, &paint, sk::FillRule::Winding, ts, None);
    }

    fn stroke(&mut self, path: &sk::Path, stroke: Stroke) {
        if stroke.width <= 0.0 || stroke.color == Color32::TRANSPARENT {
            return;
        }
        let paint = paint(stroke.color);
        let sk_stroke = sk::Stroke {
            width: stroke.width,
            line_join: sk::LineJoin::Round,
            line_cap: sk::LineCap::Round,
            ..sk::Stroke::default()
        };
        let ts = self.device_transform();
        self.pixmap.stroke_path(path, &paint, &sk_stroke, ts, None);
    }
}

fn paint(color: Color32) -> sk::Paint<'static> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let mut paint = sk::Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn build_path(points: &[Pos2], close: bool) -> Option<sk::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = sk::PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

impl Surface for RasterSurface {
    fn logical_size(&self) -> Vec2 {
        self.logical_size
    }

    fn clear(&mut self) {
        self.pixmap.fill(sk::Color::TRANSPARENT);
        self.transform = Affine::IDENTITY;
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color32) {
        if let Some(r) = sk::Rect::from_xywh(rect.min.x, rect.min.y, rect.width(), rect.height())
        {
            let paint = paint(color);
            let ts = self.device_transform();
            self.pixmap.fill_rect(r, &paint, ts, None);
        }
    }

    fn polygon(&mut self, ring: &[Pos2], fill: Color32, stroke: Stroke) {
        if ring.len() < 3 {
            return;
        }
        if let Some(path) = build_path(ring, true) {
            self.fill(&path, fill);
            self.stroke(&path, stroke);
        }
    }

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        if let Some(path) = sk::PathBuilder::from_circle(center.x, center.y, radius) {
            self.fill(&path, fill);
            self.stroke(&path, stroke);
        }
    }

    fn polyline(&mut self, points: &[Pos2], stroke: Stroke) {
        if points.len() < 2 {
            return;
        }
        if let Some(path) = build_path(points, false) {
            self.stroke(&path, stroke);
        }
    }

    fn text(&mut self, center: Pos2, label: &str, size: f32, color: Color32) {
        let device = self.to_device(center);
        let px = size * self.transform.scale * self.pixel_ratio;
        text::draw_centered(&mut self.pixmap, label, px, device.x, device.y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(surface: &RasterSurface, x: u32, y: u32) -> [u8; 4] {
        let p = surface.pixmap().pixel(x, y).unwrap().demultiply();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    #[test]
    fn test_empty_size_is_rejected() {
        assert!(RasterSurface::new(Vec2::new(0.0, 10.0), 1.0).is_none());
        assert!(RasterSurface::new(Vec2::new(10.0, 10.0), 0.0).is_none());
    }

    #[test]
    fn test_pixel_ratio_scales_pixmap() {
        let surface = RasterSurface::new(Vec2::new(80.0, 52.0), 2.0).unwrap();
        assert_eq!(surface.pixmap().width(), 160);
        assert_eq!(surface.pixmap().height(), 104);
        assert!(surface.matches(Vec2::new(80.0, 52.0), 2.0));
        assert!(!surface.matches(Vec2::new(80.0, 52.0), 1.0));
    }

    #[test]
    fn test_fill_rect_respects_transform() {
        let mut surface = RasterSurface::new(Vec2::new(20.0, 20.0), 1.0).unwrap();
        surface.clear();
        surface.set_transform(Affine::translate(Vec2::new(10.0, 0.0)));
        surface.fill_rect(
            Rect::from_min_size(Pos2::ZERO, Vec2::new(10.0, 20.0)),
            Color32::from_rgb(255, 0, 0),
        );

        assert_eq!(pixel(&surface, 2, 10)[3], 0);
        assert_eq!(pixel(&surface, 15, 10), [255, 0, 0, 255]);
    }

    #[test]
    fn test_circle_fills_center() {
        let mut surface = RasterSurface::new(Vec2::new(20.0, 20.0), 2.0).unwrap();
        surface.clear();
        surface.circle(
            Pos2::new(10.0, 10.0),
            4.0,
            Color32::from_rgb(0, 0, 255),
            Stroke::NONE,
        );
        assert_eq!(pixel(&surface, 20, 20), [0, 0, 255, 255]);
        assert_eq!(pixel(&surface, 1, 1)[3], 0);
    }

    #[test]
    fn test_clear_resets_pixels_and_transform() {
        let mut surface = RasterSurface::new(Vec2::new(10.0, 10.0), 1.0).unwrap();
        surface.set_transform(Affine::scale(3.0));
        surface.fill_rect(
            Rect::from_min_size(Pos2::ZERO, Vec2::splat(10.0)),
            Color32::WHITE,
        );
        surface.clear();
        assert!(surface.pixmap().pixels().iter().all(|p| p.alpha() == 0));
        assert_eq!(surface.transform, Affine::IDENTITY);
    }
}
