//! Texture cache for the rendered simulated map.
//!
//! The scene is rasterised on the CPU and uploaded as an egui texture. The
//! upload is repeated only when something that affects the picture changes.

use super::view::ViewState;
use crate::state::Point;
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Everything the rendered map depends on, folded into a comparable key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RenderSignature {
    /// Hash of the point list and the view
    pub content: u64,
    /// Number of geography features drawn
    pub feature_count: usize,
    /// Rendered image dimensions in pixels
    pub dimensions: (usize, usize),
}

impl RenderSignature {
    pub fn new(
        points: &[Point],
        view: &ViewState,
        feature_count: usize,
        dimensions: (usize, usize),
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        points.len().hash(&mut hasher);
        for point in points {
            point.id.hash(&mut hasher);
            point.lat.to_bits().hash(&mut hasher);
            point.lng.to_bits().hash(&mut hasher);
        }
        view.zoom.to_bits().hash(&mut hasher);
        view.pan_offset.x.to_bits().hash(&mut hasher);
        view.pan_offset.y.to_bits().hash(&mut hasher);

        Self {
            content: hasher.finish(),
            feature_count,
            dimensions,
        }
    }
}

/// Holds the current map texture and the signature it was rendered for.
pub struct MapTextureCache {
    texture: Option<TextureHandle>,
    signature: Option<RenderSignature>,
}

impl Default for MapTextureCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MapTextureCache {
    pub fn new() -> Self {
        Self {
            texture: None,
            signature: None,
        }
    }

    /// True if the cached texture was rendered for `signature`.
    pub fn is_valid(&self, signature: &RenderSignature) -> bool {
        self.signature.as_ref() == Some(signature) && self.texture.is_some()
    }

    /// Uploads a new image, reusing the texture handle when there is one.
    pub fn update(&mut self, ctx: &egui::Context, signature: RenderSignature, image: ColorImage) {
        log::debug!(
            "Updating map texture: {}x{} for signature {:x}",
            image.width(),
            image.height(),
            signature.content
        );

        let options = TextureOptions {
            magnification: egui::TextureFilter::Linear,
            minification: egui::TextureFilter::Linear,
            ..Default::default()
        };

        match &mut self.texture {
            Some(texture) => texture.set(image, options),
            None => self.texture = Some(ctx.load_texture("simulated_map", image, options)),
        }
        self.signature = Some(signature);
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }

    /// Forces a re-render on the next frame.
    pub fn invalidate(&mut self) {
        self.signature = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{Pos2, Vec2};

    fn point(id: u64, lat: f64, lng: f64) -> Point {
        Point {
            id,
            name: format!("P{}", id),
            lat,
            lng,
        }
    }

    #[test]
    fn test_signature_tracks_inputs() {
        let view = ViewState::new(Vec2::new(800.0, 520.0));
        let points = vec![point(1, 0.0, 0.0), point(2, 1.0, 1.0)];
        let base = RenderSignature::new(&points, &view, 10, (800, 520));

        assert_eq!(base, RenderSignature::new(&points, &view, 10, (800, 520)));
        assert_ne!(base, RenderSignature::new(&points[..1], &view, 10, (800, 520)));
        assert_ne!(base, RenderSignature::new(&points, &view, 11, (800, 520)));
        assert_ne!(base, RenderSignature::new(&points, &view, 10, (400, 260)));

        let mut zoomed = view.clone();
        zoomed.apply_zoom(1.2, Pos2::new(10.0, 10.0));
        assert_ne!(base, RenderSignature::new(&points, &zoomed, 10, (800, 520)));
    }

    #[test]
    fn test_drag_flag_does_not_change_signature() {
        let mut view = ViewState::new(Vec2::new(800.0, 520.0));
        let before = RenderSignature::new(&[], &view, 0, (800, 520));
        view.dragging = true;
        view.last_pointer = Pos2::new(3.0, 4.0);
        assert_eq!(before, RenderSignature::new(&[], &view, 0, (800, 520)));
    }

    #[test]
    fn test_cache_validity() {
        let ctx = egui::Context::default();
        let mut cache = MapTextureCache::new();
        let signature = RenderSignature::new(&[], &ViewState::new(Vec2::splat(4.0)), 0, (4, 4));
        assert!(!cache.is_valid(&signature));

        cache.update(
            &ctx,
            signature,
            ColorImage::from_rgba_unmultiplied([4, 4], &[255u8; 64]),
        );
        assert!(cache.is_valid(&signature));
        assert!(cache.texture().is_some());

        cache.invalidate();
        assert!(!cache.is_valid(&signature));
    }
}
