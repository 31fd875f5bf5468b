//! Modal notice window.

use crate::state::AppState;
use eframe::egui::{self, RichText};

pub fn render_notice(ctx: &egui::Context, state: &mut AppState) {
    let Some(notice) = &state.notice else {
        return;
    };

    let mut dismissed = false;
    egui::Modal::new(egui::Id::new("notice")).show(ctx, |ui| {
        ui.set_max_width(360.0);
        ui.label(RichText::new(&notice.title).strong().size(15.0));
        ui.add_space(6.0);
        ui.label(&notice.message);
        ui.add_space(10.0);
        if ui.button("OK").clicked() {
            dismissed = true;
        }
    });

    if dismissed {
        state.notice = None;
    }
}
