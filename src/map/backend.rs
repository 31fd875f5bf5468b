//! Map backends: the built-in simulated map and the hosted map service.
//!
//! The application talks to whichever backend was selected at startup
//! through [`MapBackend`]. The simulated map owns its view state, renders the
//! scene into a reused raster and shows it as a texture. The service map only
//! describes what should be drawn and hands that to a page-provided bridge.

use super::interaction::{InteractionController, PointerEvent};
use super::texture_cache::{MapTextureCache, RenderSignature};
use super::view::ViewState;
use crate::config::AppConfig;
use crate::geo::GeographyFeature;
use crate::render::{colors, render_scene, RasterSurface};
use crate::state::Point;
use eframe::egui::{self, Color32, Pos2, Rect, RichText, Sense, Vec2};
use serde::Serialize;

/// Pixel ratio of the surface handed to the exporter.
pub const EXPORT_PIXEL_RATIO: f32 = 2.0;

/// Errors reported by a map backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The page did not provide a usable map service bridge.
    BridgeUnavailable(String),
    /// The bridge was found but rejected the request.
    BridgeFailed(String),
    /// The overlay could not be serialized.
    Serialize(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::BridgeUnavailable(msg) => write!(f, "Map service unavailable: {}", msg),
            BackendError::BridgeFailed(msg) => write!(f, "Map service error: {}", msg),
            BackendError::Serialize(msg) => write!(f, "Overlay serialization failed: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// Requests a backend raises from its own controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapAction {
    /// Save the displayed map as an image
    Screenshot,
}

pub trait MapBackend {
    fn name(&self) -> &'static str;

    /// True once the map can accept drawing requests.
    fn is_ready(&self) -> bool;

    /// Draws the route through `points` in order.
    fn draw_trajectory(&mut self, points: &[Point]) -> Result<(), BackendError>;

    /// Lays out the map in `ui` for this frame.
    fn show(
        &mut self,
        ui: &mut egui::Ui,
        features: &[GeographyFeature],
        points: &[Point],
    ) -> Option<MapAction>;

    /// Renders the map for export at [`EXPORT_PIXEL_RATIO`]. `None` when the
    /// backend has no raster of its own.
    fn export_surface(
        &mut self,
        features: &[GeographyFeature],
        points: &[Point],
    ) -> Option<&RasterSurface>;

    /// The raster currently on screen, if any.
    fn display_surface(&self) -> Option<&RasterSurface>;
}

/// Picks the service map when a usable credential is configured, falling
/// back to the simulated map otherwise or when the service cannot start.
pub fn select_backend(config: &AppConfig) -> Box<dyn MapBackend> {
    if let Some(key) = config.service_api_key() {
        match ServiceMap::connect(key) {
            Ok(map) => {
                log::info!("Using map service backend");
                return Box::new(map);
            }
            Err(e) => log::warn!("{}; falling back to the simulated map", e),
        }
    } else {
        log::info!("No map service credential configured, using the simulated map");
    }
    Box::new(SimulatedMap::new(config.canvas_size))
}

// ---------------------------------------------------------------------------
// Simulated map
// ---------------------------------------------------------------------------

/// The software-rendered world map with pan and zoom.
pub struct SimulatedMap {
    view: ViewState,
    controller: InteractionController,
    display: Option<RasterSurface>,
    export: Option<RasterSurface>,
    textures: MapTextureCache,
}

impl SimulatedMap {
    pub fn new(canvas_size: Vec2) -> Self {
        Self {
            view: ViewState::new(canvas_size),
            controller: InteractionController::new(),
            display: None,
            export: None,
            textures: MapTextureCache::new(),
        }
    }

    /// Feeds one input event to the controller.
    pub fn handle_event(&mut self, event: PointerEvent) -> bool {
        self.controller.handle(&mut self.view, event)
    }

    /// Re-renders the display raster if its inputs changed. Returns the
    /// signature of what is now on the raster.
    fn refresh_display(
        &mut self,
        ctx: &egui::Context,
        features: &[GeographyFeature],
        points: &[Point],
        pixel_ratio: f32,
    ) -> Option<RenderSignature> {
        let size = self.view.canvas_size;
        let reuse = self
            .display
            .as_ref()
            .is_some_and(|s| s.matches(size, pixel_ratio));
        if !reuse {
            self.display = RasterSurface::new(size, pixel_ratio);
            // A fresh surface is blank even when its pixel size is unchanged
            self.textures.invalidate();
        }
        let surface = self.display.as_mut()?;

        let dimensions = (
            surface.pixmap().width() as usize,
            surface.pixmap().height() as usize,
        );
        let signature = RenderSignature::new(points, &self.view, features.len(), dimensions);
        if !self.textures.is_valid(&signature) {
            let start = web_time::Instant::now();
            render_scene(surface, features, points, &self.view);
            self.textures.update(ctx, signature, surface.to_color_image());
            log::debug!(
                "Rendered map {}x{} in {:.1}ms",
                dimensions.0,
                dimensions.1,
                start.elapsed().as_secs_f64() * 1000.0
            );
        }
        Some(signature)
    }

    fn controls(&mut self, ui: &mut egui::Ui) -> Option<MapAction> {
        let mut action = None;
        ui.horizontal(|ui| {
            if ui.button(RichText::new("+").size(14.0)).on_hover_text("Zoom in").clicked() {
                self.handle_event(PointerEvent::ZoomIn);
            }
            if ui.button(RichText::new("\u{2212}").size(14.0)).on_hover_text("Zoom out").clicked() {
                self.handle_event(PointerEvent::ZoomOut);
            }
            if ui.button("Reset view").clicked() {
                self.handle_event(PointerEvent::Reset);
            }
            if ui
                .button("Screenshot")
                .on_hover_text("Save the map as map-screenshot.png")
                .clicked()
            {
                action = Some(MapAction::Screenshot);
            }
            ui.separator();
            ui.label(
                RichText::new(format!("Zoom {:.2}x", self.view.zoom))
                    .monospace()
                    .size(12.0)
                    .color(Color32::GRAY),
            );
        });
        action
    }
}

impl MapBackend for SimulatedMap {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn draw_trajectory(&mut self, points: &[Point]) -> Result<(), BackendError> {
        log::info!("Drawing trajectory through {} points", points.len());
        self.textures.invalidate();
        Ok(())
    }

    fn show(
        &mut self,
        ui: &mut egui::Ui,
        features: &[GeographyFeature],
        points: &[Point],
    ) -> Option<MapAction> {
        let action = self.controls(ui);

        let logical = self.view.canvas_size;
        let available = ui.available_size();
        let scale = (available.x / logical.x)
            .min(available.y / logical.y)
            .max(0.1);
        let (rect, response) = ui.allocate_exact_size(logical * scale, Sense::click_and_drag());

        let events = self
            .controller
            .events_from_response(&response, &self.view, rect);
        for event in events {
            self.handle_event(event);
        }

        let pixel_ratio = ui.ctx().pixels_per_point() * scale;
        self.refresh_display(ui.ctx(), features, points, pixel_ratio);

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 4.0, colors::map::BACKDROP);
        if let Some(texture) = self.textures.texture() {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        if self.view.dragging {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        } else if response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
        }

        action
    }

    fn export_surface(
        &mut self,
        features: &[GeographyFeature],
        points: &[Point],
    ) -> Option<&RasterSurface> {
        let size = self.view.canvas_size;
        let reuse = self
            .export
            .as_ref()
            .is_some_and(|s| s.matches(size, EXPORT_PIXEL_RATIO));
        if !reuse {
            self.export = RasterSurface::new(size, EXPORT_PIXEL_RATIO);
        }
        let surface = self.export.as_mut()?;
        render_scene(surface, features, points, &self.view);
        Some(&*surface)
    }

    fn display_surface(&self) -> Option<&RasterSurface> {
        self.display.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Service map
// ---------------------------------------------------------------------------

/// Initial center of the service map (São Paulo).
pub const SERVICE_DEFAULT_CENTER: LatLng = LatLng {
    lat: -23.55,
    lng: -46.63,
};
pub const SERVICE_DEFAULT_ZOOM: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMarker {
    pub position: LatLng,
    /// 1-based ordinal shown on the marker
    pub label: String,
    pub title: String,
    /// Text for the info window opened on click
    pub info: String,
    pub fill_color: &'static str,
    pub stroke_color: &'static str,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePolyline {
    pub path: Vec<LatLng>,
    pub geodesic: bool,
    pub stroke_color: &'static str,
    pub stroke_opacity: f32,
    pub stroke_weight: f32,
}

/// Everything the hosted map needs to draw for the current points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOverlay {
    pub center: LatLng,
    pub zoom: u8,
    pub markers: Vec<ServiceMarker>,
    pub polyline: Option<ServicePolyline>,
    /// Bounds to fit; absent when there are no points
    pub fit_bounds: Option<LatLngBounds>,
}

impl ServiceOverlay {
    pub fn build(points: &[Point]) -> Self {
        let markers = points
            .iter()
            .enumerate()
            .map(|(i, p)| ServiceMarker {
                position: LatLng {
                    lat: p.lat,
                    lng: p.lng,
                },
                label: (i + 1).to_string(),
                title: p.name.clone(),
                info: format!("{}\nLat: {}\nLng: {}", p.name, p.lat, p.lng),
                fill_color: "#4F46E5",
                stroke_color: "#FFFFFF",
                scale: 8.0,
            })
            .collect();

        let polyline = (points.len() >= 2).then(|| ServicePolyline {
            path: points
                .iter()
                .map(|p| LatLng {
                    lat: p.lat,
                    lng: p.lng,
                })
                .collect(),
            geodesic: true,
            stroke_color: "#FF0000",
            stroke_opacity: 1.0,
            stroke_weight: 3.0,
        });

        let fit_bounds = points.iter().fold(None, |bounds: Option<LatLngBounds>, p| {
            Some(match bounds {
                None => LatLngBounds {
                    south: p.lat,
                    west: p.lng,
                    north: p.lat,
                    east: p.lng,
                },
                Some(b) => LatLngBounds {
                    south: b.south.min(p.lat),
                    west: b.west.min(p.lng),
                    north: b.north.max(p.lat),
                    east: b.east.max(p.lng),
                },
            })
        });

        Self {
            center: SERVICE_DEFAULT_CENTER,
            zoom: SERVICE_DEFAULT_ZOOM,
            markers,
            polyline,
            fit_bounds,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BridgeRequest<'a> {
    api_key: &'a str,
    overlay: &'a ServiceOverlay,
}

/// JSON handed to `window.trajectoryMapService.show`.
pub fn bridge_payload(api_key: &str, overlay: &ServiceOverlay) -> Result<String, BackendError> {
    serde_json::to_string(&BridgeRequest { api_key, overlay })
        .map_err(|e| BackendError::Serialize(e.to_string()))
}

/// The hosted map widget, driven through a JavaScript bridge.
pub struct ServiceMap {
    api_key: String,
    overlay: ServiceOverlay,
    shown_ids: Vec<u64>,
    ready: bool,
}

impl ServiceMap {
    /// Starts the hosted map with an empty overlay.
    pub fn connect(api_key: &str) -> Result<Self, BackendError> {
        let mut map = Self {
            api_key: api_key.to_string(),
            overlay: ServiceOverlay::build(&[]),
            shown_ids: Vec::new(),
            ready: false,
        };
        map.push()?;
        map.ready = true;
        Ok(map)
    }

    pub fn overlay(&self) -> &ServiceOverlay {
        &self.overlay
    }

    fn push(&mut self) -> Result<(), BackendError> {
        let payload = bridge_payload(&self.api_key, &self.overlay)?;
        bridge::show(&payload)
    }

    fn sync(&mut self, points: &[Point]) -> Result<(), BackendError> {
        self.overlay = ServiceOverlay::build(points);
        self.shown_ids = points.iter().map(|p| p.id).collect();
        self.push()
    }
}

impl MapBackend for ServiceMap {
    fn name(&self) -> &'static str {
        "service"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn draw_trajectory(&mut self, points: &[Point]) -> Result<(), BackendError> {
        let result = self.sync(points);
        if let Err(e) = &result {
            log::error!("{}", e);
            self.ready = false;
        }
        result
    }

    fn show(
        &mut self,
        ui: &mut egui::Ui,
        _features: &[GeographyFeature],
        points: &[Point],
    ) -> Option<MapAction> {
        let unchanged = self.shown_ids.len() == points.len()
            && self.shown_ids.iter().zip(points).all(|(id, p)| *id == p.id);
        if !unchanged {
            if let Err(e) = self.sync(points) {
                log::error!("{}", e);
                self.ready = false;
            }
        }

        let size = Vec2::new(ui.available_width(), ui.available_height().max(120.0));
        let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
        ui.painter().rect_filled(rect, 4.0, colors::map::BACKDROP);
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            format!("Map service showing {} points", self.overlay.markers.len()),
            egui::FontId::proportional(14.0),
            Color32::DARK_GRAY,
        );
        None
    }

    fn export_surface(
        &mut self,
        _features: &[GeographyFeature],
        _points: &[Point],
    ) -> Option<&RasterSurface> {
        None
    }

    fn display_surface(&self) -> Option<&RasterSurface> {
        None
    }
}

#[cfg(target_arch = "wasm32")]
mod bridge {
    use super::BackendError;
    use wasm_bindgen::{JsCast, JsValue};

    const SERVICE_OBJECT: &str = "trajectoryMapService";

    pub fn show(payload: &str) -> Result<(), BackendError> {
        let window = web_sys::window()
            .ok_or_else(|| BackendError::BridgeUnavailable("no window".to_string()))?;
        let service = js_sys::Reflect::get(&window, &JsValue::from_str(SERVICE_OBJECT))
            .ok()
            .filter(|v| v.is_object())
            .ok_or_else(|| {
                BackendError::BridgeUnavailable(format!("window.{} is not defined", SERVICE_OBJECT))
            })?;
        let show: js_sys::Function = js_sys::Reflect::get(&service, &JsValue::from_str("show"))
            .ok()
            .and_then(|f| f.dyn_into().ok())
            .ok_or_else(|| {
                BackendError::BridgeUnavailable(format!("window.{}.show is not a function", SERVICE_OBJECT))
            })?;
        show.call1(&service, &JsValue::from_str(payload))
            .map(|_| ())
            .map_err(|e| BackendError::BridgeFailed(format!("{:?}", e)))
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod bridge {
    use super::BackendError;

    pub fn show(_payload: &str) -> Result<(), BackendError> {
        Err(BackendError::BridgeUnavailable(
            "the hosted map needs a browser page".to_string(),
        ))
    }
}
