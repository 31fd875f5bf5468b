//! Exports: GeoJSON, text report, composited PNG and file download.

pub mod capture;
pub mod download;
pub mod geojson;
pub mod report;

pub use capture::{CaptureChannel, CaptureError, CaptureJob};
pub use download::{save_file, SaveOutcome};
