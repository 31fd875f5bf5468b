//! Top bar UI: app title, map backend, geography and status.

use crate::geo::GeographyStore;
use crate::state::AppState;
use eframe::egui::{self, Color32, RichText};

pub fn render_top_bar(
    ctx: &egui::Context,
    state: &AppState,
    geography: &GeographyStore,
    backend_name: &str,
) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.label(
                    RichText::new("Trajectory Workbench")
                        .strong()
                        .size(16.0)
                        .color(Color32::WHITE),
                );

                ui.separator();

                ui.label(
                    RichText::new(format!("Map: {}", backend_name))
                        .size(12.0)
                        .color(Color32::GRAY),
                );

                ui.separator();

                if geography.is_loading() {
                    ui.spinner();
                    ui.label(RichText::new("Loading geography...").size(12.0).color(Color32::GRAY));
                } else if geography.error().is_some() {
                    ui.label(
                        RichText::new("Geography unavailable")
                            .size(12.0)
                            .color(Color32::from_rgb(220, 120, 100)),
                    );
                } else {
                    ui.label(
                        RichText::new(format!("{} land features", geography.features().len()))
                            .size(12.0)
                            .color(Color32::GRAY),
                    );
                }

                ui.separator();

                ui.label(
                    RichText::new(&state.status_message)
                        .size(13.0)
                        .color(Color32::GRAY),
                );
            });
        });
}
