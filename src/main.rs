#![warn(clippy::all)]

//! Trajectory Workbench - plot named points on a world map and export the route.
//!
//! Points are entered by hand (or from a set of examples), connected in
//! entry order and drawn on a software-rendered world map that supports
//! pan and zoom. The trajectory can be exported as GeoJSON, as a text
//! report, or as a print-resolution PNG with an information panel.

mod config;
mod export;
mod geo;
mod map;
mod render;
mod state;
mod ui;

use config::AppConfig;
use eframe::egui;
use export::{CaptureChannel, CaptureError, CaptureJob, SaveOutcome};
use geo::GeographyStore;
use map::{MapAction, MapBackend, SimulatedMap};
use state::{require_points, AppState};
use ui::UiAction;

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions::default();

    eframe::run_native(
        "Trajectory Workbench",
        native_options,
        Box::new(|cc| Ok(Box::new(TrajectoryApp::new(cc)))),
    )
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document to start in");
            return;
        };

        let Some(canvas) = document
            .get_element_by_id("app_canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("Failed to find app_canvas");
            return;
        };

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(TrajectoryApp::new(cc)))),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The app has crashed. See the developer console for details.</p>",
                    );
                    log::error!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}

/// Main application state and logic.
pub struct TrajectoryApp {
    /// Points, entry form and UI feedback
    state: AppState,

    /// Resolved configuration
    config: AppConfig,

    /// World boundaries, loaded once per session
    geography: GeographyStore,

    /// Active map (simulated or hosted service)
    backend: Box<dyn MapBackend>,

    /// Channel for background PNG captures
    capture: CaptureChannel,
}

impl TrajectoryApp {
    /// Creates a new TrajectoryApp instance.
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = AppConfig::load();
        let backend = map::select_backend(&config);
        log::info!("Using {} map", backend.name());

        Self {
            state: AppState::new(),
            geography: GeographyStore::new(config.geography_url.clone()),
            backend,
            capture: CaptureChannel::new(),
            config,
        }
    }

    /// Replaces a backend that lost its readiness with the simulated map.
    fn ensure_backend(&mut self) {
        if self.backend.is_ready() {
            return;
        }
        log::warn!(
            "{} map is not ready, falling back to the simulated map",
            self.backend.name()
        );
        self.backend = Box::new(SimulatedMap::new(self.config.canvas_size));
        self.state.set_status("Map service unavailable, using the built-in map");
    }

    fn handle_ui_action(&mut self, ctx: &egui::Context, action: UiAction) {
        match action {
            UiAction::DrawTrajectory => self.draw_trajectory(),
            UiAction::ExportGeoJson => self.export_geojson(),
            UiAction::ExportReport => self.export_report(),
            UiAction::CaptureMap => self.start_capture(ctx),
        }
    }

    fn draw_trajectory(&mut self) {
        if let Err(e) = require_points(&self.state.points, "draw a trajectory", 2) {
            self.state.notify("Not enough points", e.to_string());
            return;
        }
        match self.backend.draw_trajectory(self.state.points.as_slice()) {
            Ok(()) => self.state.set_status(format!(
                "Trajectory drawn through {} points",
                self.state.points.len()
            )),
            Err(e) => self.state.notify("Map error", e.to_string()),
        }
    }

    fn export_geojson(&mut self) {
        if let Err(e) = require_points(&self.state.points, "export GeoJSON", 1) {
            self.state.notify("Nothing to export", e.to_string());
            return;
        }
        match export::geojson::to_geojson_string(self.state.points.as_slice()) {
            Ok(json) => self.save(
                export::geojson::GEOJSON_FILE_NAME,
                export::download::MIME_GEOJSON,
                json.as_bytes(),
            ),
            Err(e) => self.state.notify("Export failed", e.to_string()),
        }
    }

    fn export_report(&mut self) {
        if let Err(e) = require_points(&self.state.points, "download a report", 1) {
            self.state.notify("Nothing to export", e.to_string());
            return;
        }
        let now = chrono::Local::now().naive_local();
        match export::report::build_report(self.state.points.as_slice(), now) {
            Ok(report) => self.save(
                export::report::REPORT_FILE_NAME,
                export::download::MIME_TEXT,
                report.as_bytes(),
            ),
            Err(e) => self.state.notify("Export failed", e.to_string()),
        }
    }

    fn start_capture(&mut self, ctx: &egui::Context) {
        if let Err(e) = require_points(&self.state.points, "capture the map", 1) {
            self.state.notify("Nothing to capture", e.to_string());
            return;
        }
        let features = self.geography.features();
        let points = self.state.points.as_slice();
        let Some(map) = self.backend.export_surface(features, points).cloned() else {
            self.state
                .notify("Capture failed", CaptureError::SurfaceMissing.to_string());
            return;
        };

        let job = CaptureJob {
            map,
            points: points.to_vec(),
            date: chrono::Local::now().date_naive(),
        };
        match self.capture.start(ctx, job) {
            Ok(()) => self.state.set_status("Capturing map..."),
            Err(e) => self.state.notify("Capture failed", e.to_string()),
        }
    }

    fn handle_map_action(&mut self, action: MapAction) {
        match action {
            MapAction::Screenshot => {
                let encoded = self
                    .backend
                    .display_surface()
                    .ok_or(CaptureError::SurfaceMissing)
                    .and_then(|surface| export::capture::encode_png(surface.pixmap()));
                match encoded {
                    Ok(png) => self.save(
                        export::capture::SCREENSHOT_FILE_NAME,
                        export::download::MIME_PNG,
                        &png,
                    ),
                    Err(e) => self.state.notify("Screenshot failed", e.to_string()),
                }
            }
        }
    }

    fn save(&mut self, file_name: &str, mime: &str, bytes: &[u8]) {
        match export::save_file(file_name, mime, bytes) {
            Ok(SaveOutcome::Saved(path)) => self.state.set_status(format!("Saved {}", path)),
            Ok(SaveOutcome::Cancelled) => self.state.set_status("Save cancelled"),
            Err(e) => self.state.notify("Download failed", e.to_string()),
        }
    }
}

impl eframe::App for TrajectoryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Start the geography fetch on the first frame
        self.geography.load(ctx);
        if self.geography.poll() {
            if let Some(e) = self.geography.error() {
                self.state.set_status(format!("Geography unavailable: {}", e));
            }
            ctx.request_repaint();
        }

        // Check for a finished capture
        if let Some(result) = self.capture.try_recv() {
            match result {
                Ok(output) => self.save(&output.file_name, export::download::MIME_PNG, &output.png),
                Err(e) => self.state.notify("Capture failed", e.to_string()),
            }
        }

        self.ensure_backend();

        // Side and top/bottom panels must be rendered before CentralPanel
        ui::render_top_bar(ctx, &self.state, &self.geography, self.backend.name());
        let ui_action = ui::render_left_panel(ctx, &mut self.state, self.capture.is_pending());
        let map_action = ui::render_canvas(
            ctx,
            self.backend.as_mut(),
            self.geography.features(),
            self.state.points.as_slice(),
        );
        ui::render_notice(ctx, &mut self.state);

        if let Some(action) = ui_action {
            self.handle_ui_action(ctx, action);
        }
        if let Some(action) = map_action {
            self.handle_map_action(action);
        }
    }
}
