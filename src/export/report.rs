//! Plain-text trajectory report.

use super::geojson::to_geojson_string;
use crate::geo::distance::trajectory_distance_km;
use crate::state::Point;
use chrono::NaiveDateTime;
use std::fmt::Write;

pub const REPORT_FILE_NAME: &str = "trajectory_report.txt";

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));
}

/// Builds the report: summary, point listing, trajectory figures when there
/// are at least two points, and the GeoJSON document.
pub fn build_report(
    points: &[Point],
    generated_at: NaiveDateTime,
) -> Result<String, serde_json::Error> {
    let mut out = String::new();

    let title = "TRAJECTORY WORKBENCH REPORT";
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}\n", "=".repeat(title.len()));
    let _ = writeln!(out, "Total points: {}", points.len());
    let _ = writeln!(
        out,
        "Generated: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    heading(&mut out, "TRAJECTORY POINTS:");
    for (i, point) in points.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, point.name);
        let _ = writeln!(out, "   Latitude: {}", point.lat);
        let _ = writeln!(out, "   Longitude: {}\n", point.lng);
    }

    if points.len() >= 2 {
        heading(&mut out, "TRAJECTORY INFORMATION:");
        let _ = writeln!(
            out,
            "Approximate total distance: {:.2} km",
            trajectory_distance_km(points)
        );
        let _ = writeln!(out, "Segments: {}\n", points.len() - 1);
    }

    heading(&mut out, "GEOJSON FORMAT:");
    out.push_str(&to_geojson_string(points)?);
    out.push('\n');

    Ok(out)
}
