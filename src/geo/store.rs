//! One-shot asynchronous loading of the world boundary dataset.
//!
//! Uses channel-based communication to bridge the fetch task with egui's
//! synchronous update loop, the same way file picks and exports do.

use super::topojson::Topology;
use super::{features, GeographyFeature};
use eframe::egui;
use geojson::GeoJson;
use serde::Deserialize;
use std::sync::mpsc::{channel, Receiver};

/// Default world boundaries: Natural Earth 1:110m countries as TopoJSON.
pub const DEFAULT_GEOGRAPHY_URL: &str =
    "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json";

/// Errors that can occur while loading geography.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceLoadError {
    /// The dataset could not be retrieved.
    Fetch(String),
    /// The dataset was retrieved but is not valid TopoJSON or GeoJSON.
    Decode(String),
    /// The document parsed but is of an unknown kind.
    Unsupported(String),
}

impl std::fmt::Display for ResourceLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceLoadError::Fetch(msg) => write!(f, "Fetch failed: {}", msg),
            ResourceLoadError::Decode(msg) => write!(f, "Decode failed: {}", msg),
            ResourceLoadError::Unsupported(kind) => write!(f, "Unsupported dataset type: {}", kind),
        }
    }
}

impl std::error::Error for ResourceLoadError {}

type LoadResult = Result<Vec<GeographyFeature>, ResourceLoadError>;

/// Decodes a TopoJSON topology or any GeoJSON document into land features.
pub fn decode_dataset(text: &str) -> LoadResult {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ResourceLoadError::Decode(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| ResourceLoadError::Unsupported("missing \"type\"".to_string()))?;

    match kind {
        "Topology" => {
            let topology = Topology::deserialize(&value)
                .map_err(|e| ResourceLoadError::Decode(e.to_string()))?;
            topology
                .into_features()
                .map_err(|e| ResourceLoadError::Decode(e.to_string()))
        }
        "FeatureCollection" | "Feature" | "Polygon" | "MultiPolygon" | "GeometryCollection"
        | "Point" | "MultiPoint" | "LineString" | "MultiLineString" => {
            let geojson =
                GeoJson::from_json_value(value).map_err(|e| ResourceLoadError::Decode(e.to_string()))?;
            Ok(features::from_geojson(&geojson))
        }
        other => Err(ResourceLoadError::Unsupported(other.to_string())),
    }
}

enum LoadState {
    Idle,
    Loading(Receiver<LoadResult>),
    Ready,
    Failed(ResourceLoadError),
}

/// Session cache for the world geography.
pub struct GeographyStore {
    url: String,
    state: LoadState,
    features: Vec<GeographyFeature>,
}

impl GeographyStore {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: LoadState::Idle,
            features: Vec::new(),
        }
    }

    /// Starts the fetch. Only the first call has any effect.
    pub fn load(&mut self, ctx: &egui::Context) {
        if !matches!(self.state, LoadState::Idle) {
            return;
        }
        log::info!("Loading geography from {}", self.url);

        let (sender, receiver) = channel();
        let url = self.url.clone();
        let ctx = ctx.clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            std::thread::spawn(move || {
                let result = fetch_text(&url).and_then(|text| decode_dataset(&text));
                let _ = sender.send(result);
                ctx.request_repaint();
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                let result = fetch_text(&url).await.and_then(|text| decode_dataset(&text));
                let _ = sender.send(result);
                ctx.request_repaint();
            });
        }

        self.state = LoadState::Loading(receiver);
    }

    /// Collects a finished load. Returns true exactly once, when the load
    /// completes either way; `error()` tells which.
    pub fn poll(&mut self) -> bool {
        let LoadState::Loading(receiver) = &self.state else {
            return false;
        };
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(std::sync::mpsc::TryRecvError::Empty) => return false,
            Err(std::sync::mpsc::TryRecvError::Disconnected) => Err(ResourceLoadError::Fetch(
                "loader stopped without a result".to_string(),
            )),
        };

        match result {
            Ok(features) => {
                log::info!("Loaded {} geography features", features.len());
                self.features = features;
                self.state = LoadState::Ready;
                true
            }
            Err(e) => {
                log::error!("Failed to load geography: {}", e);
                self.state = LoadState::Failed(e);
                true
            }
        }
    }

    /// Features available now; empty before load or after a failure.
    pub fn features(&self) -> &[GeographyFeature] {
        &self.features
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading(_))
    }

    pub fn error(&self) -> Option<&ResourceLoadError> {
        match &self.state {
            LoadState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn fetch_text(url: &str) -> Result<String, ResourceLoadError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        reqwest::blocking::get(url)
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| ResourceLoadError::Fetch(e.to_string()))
    } else {
        let path = url.strip_prefix("file://").unwrap_or(url);
        std::fs::read_to_string(path).map_err(|e| ResourceLoadError::Fetch(format!("{}: {}", path, e)))
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str) -> Result<String, ResourceLoadError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let js_err = |e: wasm_bindgen::JsValue| ResourceLoadError::Fetch(format!("{:?}", e));

    let window =
        web_sys::window().ok_or_else(|| ResourceLoadError::Fetch("no window".to_string()))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(js_err)?;
    let response: web_sys::Response = response.dyn_into().map_err(js_err)?;
    if !response.ok() {
        return Err(ResourceLoadError::Fetch(format!("HTTP {}", response.status())));
    }
    let text = JsFuture::from(response.text().map_err(js_err)?)
        .await
        .map_err(js_err)?;
    text.as_string()
        .ok_or_else(|| ResourceLoadError::Decode("response body is not text".to_string()))
}
