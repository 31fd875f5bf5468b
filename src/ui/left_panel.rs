//! Left panel UI: point entry, point list and export actions.

use super::UiAction;
use crate::geo::distance::trajectory_distance_km;
use crate::state::AppState;
use eframe::egui::{self, Color32, RichText};

pub fn render_left_panel(
    ctx: &egui::Context,
    state: &mut AppState,
    capture_pending: bool,
) -> Option<UiAction> {
    let mut action = None;

    egui::SidePanel::left("left_panel")
        .resizable(true)
        .default_width(300.0)
        .min_width(240.0)
        .max_width(440.0)
        .show(ctx, |ui| {
            ui.heading("Add Point");
            ui.separator();
            render_point_form(ui, state);

            ui.add_space(10.0);
            ui.heading(format!("Points ({})", state.points.len()));
            ui.separator();
            render_point_list(ui, state);

            ui.add_space(10.0);
            ui.heading("Actions");
            ui.separator();
            action = render_actions(ui, capture_pending);
        });

    action
}

fn render_point_form(ui: &mut egui::Ui, state: &mut AppState) {
    let mut submit = false;

    egui::Grid::new("point_form")
        .num_columns(2)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            ui.label("Name");
            let r = ui.add(
                egui::TextEdit::singleline(&mut state.input.name)
                    .hint_text("e.g. Marco Zero")
                    .desired_width(180.0),
            );
            submit |= r.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            ui.end_row();

            ui.label("Latitude");
            let r = ui.add(
                egui::TextEdit::singleline(&mut state.input.lat)
                    .hint_text("-90 to 90")
                    .desired_width(180.0)
                    .font(egui::FontId::monospace(12.0)),
            );
            submit |= r.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            ui.end_row();

            ui.label("Longitude");
            let r = ui.add(
                egui::TextEdit::singleline(&mut state.input.lng)
                    .hint_text("-180 to 180")
                    .desired_width(180.0)
                    .font(egui::FontId::monospace(12.0)),
            );
            submit |= r.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            ui.end_row();
        });

    ui.add_space(5.0);
    ui.horizontal(|ui| {
        if ui.button("Add point").clicked() {
            submit = true;
        }
        if ui
            .button("Examples")
            .on_hover_text("Add four sample points in Brazil")
            .clicked()
        {
            state.add_examples();
        }
    });

    if submit {
        state.submit_point();
    }
}

fn render_point_list(ui: &mut egui::Ui, state: &mut AppState) {
    if state.points.is_empty() {
        ui.label(
            RichText::new("No points yet")
                .italics()
                .color(Color32::GRAY),
        );
        return;
    }

    let mut remove = None;
    egui::ScrollArea::vertical()
        .max_height(260.0)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            for (i, point) in state.points.iter().enumerate() {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("{}.", i + 1)).strong().monospace());
                    ui.vertical(|ui| {
                        ui.label(RichText::new(&point.name).strong());
                        ui.label(
                            RichText::new(format!("{:.4}, {:.4}", point.lat, point.lng))
                                .small()
                                .monospace()
                                .color(Color32::GRAY),
                        );
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("\u{2715}").on_hover_text("Remove").clicked() {
                            remove = Some(point.id);
                        }
                    });
                });
            }
        });

    if let Some(id) = remove {
        state.remove_point(id);
    }

    if state.points.len() >= 2 {
        ui.add_space(5.0);
        ui.label(
            RichText::new(format!(
                "Approximate distance: {:.2} km",
                trajectory_distance_km(state.points.as_slice())
            ))
            .small(),
        );
    }
}

fn render_actions(ui: &mut egui::Ui, capture_pending: bool) -> Option<UiAction> {
    let mut action = None;

    if ui.button("Draw trajectory").clicked() {
        action = Some(UiAction::DrawTrajectory);
    }
    if ui.button("Download GeoJSON").clicked() {
        action = Some(UiAction::ExportGeoJson);
    }
    if ui.button("Download report").clicked() {
        action = Some(UiAction::ExportReport);
    }

    ui.add_enabled_ui(!capture_pending, |ui| {
        if ui.button("Capture map").clicked() {
            action = Some(UiAction::CaptureMap);
        }
    });
    if capture_pending {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Capturing...");
        });
    }

    action
}
