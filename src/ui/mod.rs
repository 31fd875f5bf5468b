//! UI modules for the Trajectory Workbench application.
//!
//! The UI is split into distinct panels:
//! - Top bar: title, map backend, geography state and status
//! - Left panel: point entry, point list and export actions
//! - Central canvas: the map
//! - Notice: modal messages

mod canvas;
mod left_panel;
mod notice;
mod top_bar;

pub use canvas::render_canvas;
pub use left_panel::render_left_panel;
pub use notice::render_notice;
pub use top_bar::render_top_bar;

/// Requests raised by the panels and carried out by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    DrawTrajectory,
    ExportGeoJson,
    ExportReport,
    CaptureMap,
}
