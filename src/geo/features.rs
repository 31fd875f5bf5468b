//! Land geometry shared by the renderer.

use geo_types::Coord;
use geojson::{Feature, GeoJson, Geometry, Value};

/// A closed land area. Coordinates use `x = longitude`, `y = latitude`.
#[derive(Debug, Clone, PartialEq)]
pub enum GeographyFeature {
    /// Exterior ring followed by any hole rings
    Polygon {
        rings: Vec<Vec<Coord<f64>>>,
        label: Option<String>,
    },
    /// Several polygons, each given as its rings
    MultiPolygon {
        polygons: Vec<Vec<Vec<Coord<f64>>>>,
        label: Option<String>,
    },
}

impl GeographyFeature {
    /// Every ring of the feature, in source order.
    pub fn rings(&self) -> Box<dyn Iterator<Item = &Vec<Coord<f64>>> + '_> {
        match self {
            GeographyFeature::Polygon { rings, .. } => Box::new(rings.iter()),
            GeographyFeature::MultiPolygon { polygons, .. } => {
                Box::new(polygons.iter().flat_map(|rings| rings.iter()))
            }
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            GeographyFeature::Polygon { label, .. } | GeographyFeature::MultiPolygon { label, .. } => {
                label.as_deref()
            }
        }
    }
}

fn to_coords(ring: &[Vec<f64>]) -> Vec<Coord<f64>> {
    ring.iter()
        .filter(|c| c.len() >= 2)
        .map(|c| Coord { x: c[0], y: c[1] })
        .collect()
}

fn to_rings(rings: &[Vec<Vec<f64>>]) -> Vec<Vec<Coord<f64>>> {
    rings.iter().map(|ring| to_coords(ring)).collect()
}

/// Converts a parsed GeoJSON document, keeping only areal geometries.
pub fn from_geojson(geojson: &GeoJson) -> Vec<GeographyFeature> {
    let mut out = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                convert_feature(feature, &mut out);
            }
        }
        GeoJson::Feature(f) => convert_feature(f, &mut out),
        GeoJson::Geometry(g) => convert_geometry(g, None, &mut out),
    }
    out
}

fn convert_feature(feature: &Feature, out: &mut Vec<GeographyFeature>) {
    let label = feature
        .properties
        .as_ref()
        .and_then(|p| p.get("name").or_else(|| p.get("NAME")))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    if let Some(geometry) = &feature.geometry {
        convert_geometry(geometry, label, out);
    }
}

fn convert_geometry(geometry: &Geometry, label: Option<String>, out: &mut Vec<GeographyFeature>) {
    match &geometry.value {
        Value::Polygon(rings) => {
            if !rings.is_empty() {
                out.push(GeographyFeature::Polygon {
                    rings: to_rings(rings),
                    label,
                });
            }
        }
        Value::MultiPolygon(polygons) => {
            let polygons: Vec<_> = polygons
                .iter()
                .filter(|rings| !rings.is_empty())
                .map(|rings| to_rings(rings))
                .collect();
            if !polygons.is_empty() {
                out.push(GeographyFeature::MultiPolygon { polygons, label });
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                convert_geometry(g, label.clone(), out);
            }
        }
        // Points and lines carry no land area.
        _ => {}
    }
}
