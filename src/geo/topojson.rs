//! TopoJSON topology decoding.
//!
//! Arcs are shared between neighbouring shapes and, when the topology is
//! quantised, stored as integer deltas. Decoding turns every polygon object
//! back into plain coordinate rings.

use super::GeographyFeature;
use geo_types::Coord;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Object preferred when a topology carries several.
pub const PREFERRED_OBJECT: &str = "countries";

#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    transform: Option<QuantizeTransform>,
    #[serde(default)]
    objects: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct QuantizeTransform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    GeometryCollection {
        #[serde(default)]
        geometries: Vec<serde_json::Value>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        properties: Option<serde_json::Map<String, serde_json::Value>>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        properties: Option<serde_json::Map<String, serde_json::Value>>,
    },
    #[serde(other)]
    Other,
}

/// Errors raised while turning a topology into features.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyError {
    /// The topology has no objects to decode
    NoObjects,
    /// A ring references an arc that does not exist
    ArcOutOfRange(i64),
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::NoObjects => write!(f, "Topology has no objects"),
            TopologyError::ArcOutOfRange(i) => write!(f, "Arc index {} out of range", i),
        }
    }
}

impl std::error::Error for TopologyError {}

impl Topology {
    /// Decodes the `countries` object if present, otherwise the first object
    /// by name.
    pub fn into_features(self) -> Result<Vec<GeographyFeature>, TopologyError> {
        let object = self
            .objects
            .get(PREFERRED_OBJECT)
            .or_else(|| self.objects.values().next())
            .ok_or(TopologyError::NoObjects)?;

        let arcs = self.decode_arcs();
        let mut out = Vec::new();
        collect_geometry(object, &arcs, &mut out)?;
        Ok(out)
    }

    /// Absolute coordinates for every arc, undoing quantisation if any.
    fn decode_arcs(&self) -> Vec<Vec<Coord<f64>>> {
        self.arcs
            .iter()
            .map(|arc| {
                let mut x = 0.0;
                let mut y = 0.0;
                arc.iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| match self.transform {
                        Some(t) => {
                            x += p[0];
                            y += p[1];
                            Coord {
                                x: x * t.scale[0] + t.translate[0],
                                y: y * t.scale[1] + t.translate[1],
                            }
                        }
                        None => Coord { x: p[0], y: p[1] },
                    })
                    .collect()
            })
            .collect()
    }
}

fn collect_geometry(
    value: &serde_json::Value,
    arcs: &[Vec<Coord<f64>>],
    out: &mut Vec<GeographyFeature>,
) -> Result<(), TopologyError> {
    let geometry = match TopoGeometry::deserialize(value) {
        Ok(g) => g,
        Err(e) => {
            log::debug!("Skipping unreadable topology geometry: {}", e);
            return Ok(());
        }
    };

    match geometry {
        TopoGeometry::GeometryCollection { geometries } => {
            for g in &geometries {
                collect_geometry(g, arcs, out)?;
            }
        }
        TopoGeometry::Polygon {
            arcs: ring_refs,
            properties,
        } => {
            let rings = polygon_rings(&ring_refs, arcs)?;
            if !rings.is_empty() {
                out.push(GeographyFeature::Polygon {
                    rings,
                    label: name_of(properties.as_ref()),
                });
            }
        }
        TopoGeometry::MultiPolygon {
            arcs: polygon_refs,
            properties,
        } => {
            let mut polygons = Vec::with_capacity(polygon_refs.len());
            for ring_refs in &polygon_refs {
                let rings = polygon_rings(ring_refs, arcs)?;
                if !rings.is_empty() {
                    polygons.push(rings);
                }
            }
            if !polygons.is_empty() {
                out.push(GeographyFeature::MultiPolygon {
                    polygons,
                    label: name_of(properties.as_ref()),
                });
            }
        }
        TopoGeometry::Other => {}
    }
    Ok(())
}

fn name_of(properties: Option<&serde_json::Map<String, serde_json::Value>>) -> Option<String> {
    properties
        .and_then(|p| p.get("name"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn polygon_rings(
    ring_refs: &[Vec<i64>],
    arcs: &[Vec<Coord<f64>>],
) -> Result<Vec<Vec<Coord<f64>>>, TopologyError> {
    ring_refs.iter().map(|refs| stitch_ring(refs, arcs)).collect()
}

/// Joins the referenced arcs into one closed ring.
///
/// A negative index `i` refers to arc `!i` traversed backwards. Consecutive
/// arcs share an endpoint, which is kept only once.
fn stitch_ring(refs: &[i64], arcs: &[Vec<Coord<f64>>]) -> Result<Vec<Coord<f64>>, TopologyError> {
    let mut ring: Vec<Coord<f64>> = Vec::new();

    for &index in refs {
        let (arc_index, reversed) = if index < 0 {
            (!index, true)
        } else {
            (index, false)
        };
        let arc = usize::try_from(arc_index)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or(TopologyError::ArcOutOfRange(index))?;

        if !ring.is_empty() {
            ring.pop();
        }
        if reversed {
            ring.extend(arc.iter().rev().copied());
        } else {
            ring.extend(arc.iter().copied());
        }
    }

    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    Ok(ring)
}
