//! Application configuration.
//!
//! Values start from built-in defaults, then take a map service key baked in
//! at compile time, then runtime overrides: environment variables on native
//! builds and the page URL query string (`?geo=...&key=...`) on the web.

use crate::geo::store::DEFAULT_GEOGRAPHY_URL;
use eframe::egui::Vec2;

/// Logical size of the map canvas.
pub const DEFAULT_CANVAS_SIZE: Vec2 = Vec2::new(800.0, 520.0);

/// Credential value shipped in templates; never a real key.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

pub const GEOGRAPHY_URL_ENV: &str = "TRAJECTORY_GEOGRAPHY_URL";
pub const API_KEY_ENV: &str = "MAP_SERVICE_API_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// TopoJSON or GeoJSON world boundaries, URL or local path
    pub geography_url: String,
    /// Map service credential, used only when valid
    pub service_api_key: Option<String>,
    pub canvas_size: Vec2,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            geography_url: DEFAULT_GEOGRAPHY_URL.to_string(),
            service_api_key: None,
            canvas_size: DEFAULT_CANVAS_SIZE,
        }
    }
}

/// Values supplied at runtime. Unset or empty entries leave the config alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub geography_url: Option<String>,
    pub service_api_key: Option<String>,
}

impl AppConfig {
    /// Builds the configuration for this run.
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(key) = option_env!("MAP_SERVICE_API_KEY") {
            config.service_api_key = Some(key.to_string());
        }
        config.apply_overrides(runtime_overrides());

        log::info!(
            "Geography source: {}, map service key: {}",
            config.geography_url,
            if config.has_valid_service_key() {
                "configured"
            } else {
                "none"
            }
        );
        config
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.geography_url.filter(|s| !s.trim().is_empty()) {
            self.geography_url = url.trim().to_string();
        }
        if let Some(key) = overrides.service_api_key.filter(|s| !s.trim().is_empty()) {
            self.service_api_key = Some(key.trim().to_string());
        }
    }

    /// The map service key, if one is set and is not the placeholder.
    pub fn service_api_key(&self) -> Option<&str> {
        self.service_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != PLACEHOLDER_API_KEY)
    }

    pub fn has_valid_service_key(&self) -> bool {
        self.service_api_key().is_some()
    }
}

/// Parses `geo` and `key` out of a URL query string.
pub fn parse_query(query: &str) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::default();

    let query = query.trim_start_matches('?');
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let mut kv = pair.splitn(2, '=');
        let key = kv.next().unwrap_or("");
        let value = kv.next().unwrap_or("");
        match key {
            "geo" => overrides.geography_url = Some(value.to_string()),
            "key" => overrides.service_api_key = Some(value.to_string()),
            _ => {}
        }
    }

    overrides
}

#[cfg(not(target_arch = "wasm32"))]
fn runtime_overrides() -> ConfigOverrides {
    ConfigOverrides {
        geography_url: std::env::var(GEOGRAPHY_URL_ENV).ok(),
        service_api_key: std::env::var(API_KEY_ENV).ok(),
    }
}

#[cfg(target_arch = "wasm32")]
fn runtime_overrides() -> ConfigOverrides {
    let Some(search) = web_sys::window().and_then(|w| w.location().search().ok()) else {
        return ConfigOverrides::default();
    };
    let decode = |value: Option<String>| {
        value.map(|v| {
            js_sys::decode_uri_component(&v)
                .ok()
                .and_then(|s| s.as_string())
                .unwrap_or(v)
        })
    };

    let parsed = parse_query(&search);
    ConfigOverrides {
        geography_url: decode(parsed.geography_url),
        service_api_key: decode(parsed.service_api_key),
    }
}
