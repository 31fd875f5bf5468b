//! Central canvas UI: the active map backend.

use crate::geo::GeographyFeature;
use crate::map::{MapAction, MapBackend};
use crate::state::Point;
use eframe::egui;

pub fn render_canvas(
    ctx: &egui::Context,
    backend: &mut dyn MapBackend,
    features: &[GeographyFeature],
    points: &[Point],
) -> Option<MapAction> {
    egui::CentralPanel::default()
        .show(ctx, |ui| backend.show(ui, features, points))
        .inner
}
