//! Centralized color constants for the map and exports.

use eframe::egui::Color32;

/// Colors for the simulated map scene.
pub mod map {
    use super::Color32;

    /// Ocean background.
    pub const OCEAN: Color32 = Color32::from_rgb(0xb3, 0xd9, 0xff);
    /// Land fill.
    pub const LAND: Color32 = Color32::from_rgb(0xd4, 0xe2, 0xc4);
    /// Land outline.
    pub const BORDER: Color32 = Color32::from_rgb(0x66, 0x66, 0x66);
    /// Point marker fill.
    pub const MARKER: Color32 = Color32::from_rgb(0x4f, 0x46, 0xe5);
    /// Point marker outline.
    pub const MARKER_OUTLINE: Color32 = Color32::WHITE;
    /// Ordinal label drawn on markers.
    pub const MARKER_LABEL: Color32 = Color32::WHITE;
    /// Trajectory line.
    pub const TRAJECTORY: Color32 = Color32::from_rgb(0xff, 0x00, 0x00);
    /// Canvas backdrop shown where the panned map does not reach.
    pub const BACKDROP: Color32 = Color32::from_rgb(0xef, 0xf6, 0xff);
}

/// Colors for the exported PNG.
pub mod export {
    use super::Color32;

    pub const BACKGROUND: Color32 = Color32::WHITE;
    pub const TEXT: Color32 = Color32::BLACK;
}
