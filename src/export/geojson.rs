//! GeoJSON export of the point list and trajectory.

use crate::state::Point;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde_json::json;

pub const GEOJSON_FILE_NAME: &str = "trajectory.geojson";

fn properties(value: serde_json::Value) -> Option<JsonObject> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

fn feature(geometry: Value, props: serde_json::Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties: properties(props),
        foreign_members: None,
    }
}

/// One `Point` feature per entry, then a `LineString` through all of them
/// when there are at least two.
pub fn trajectory_collection(points: &[Point]) -> FeatureCollection {
    let mut features: Vec<Feature> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            feature(
                Value::Point(vec![p.lng, p.lat]),
                json!({
                    "name": p.name,
                    "description": format!("Point {}: {}", i + 1, p.name),
                    "marker": i + 1,
                }),
            )
        })
        .collect();

    if points.len() >= 2 {
        features.push(feature(
            Value::LineString(points.iter().map(|p| vec![p.lng, p.lat]).collect()),
            json!({
                "name": "Trajectory",
                "description": format!("Trajectory connecting {} points", points.len()),
                "stroke": "#FF0000",
                "stroke-width": 3,
                "stroke-opacity": 1,
            }),
        ));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Pretty-printed GeoJSON document for `points`.
pub fn to_geojson_string(points: &[Point]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&GeoJson::FeatureCollection(trajectory_collection(points)))
}
