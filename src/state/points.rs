//! Named points and the ordered point list that forms the trajectory.

use serde::{Deserialize, Serialize};

/// A named geographic point.
///
/// Points are immutable once created; the list order is the trajectory order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Unique id, assigned monotonically by the owning list
    pub id: u64,
    /// Display name (never empty)
    pub name: String,
    /// Latitude in degrees, within [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, within [-180, 180]
    pub lng: f64,
}

/// Reasons a point entry is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// One or more of name, latitude, longitude was left blank.
    MissingFields,
    /// A coordinate field could not be parsed as a finite number.
    NotANumber { field: &'static str, value: String },
    /// A coordinate is outside its valid range.
    OutOfRange { lat: f64, lng: f64 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingFields => {
                write!(f, "Please fill in the name, latitude and longitude.")
            }
            ValidationError::NotANumber { field, value } => {
                write!(f, "Invalid {}: '{}' is not a number.", field, value)
            }
            ValidationError::OutOfRange { lat, lng } => write!(
                f,
                "Coordinates ({}, {}) out of range (lat: -90 to 90, lng: -180 to 180).",
                lat, lng
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Raw point entry as typed into the form.
#[derive(Debug, Clone, Default)]
pub struct PointInput {
    pub name: String,
    pub lat: String,
    pub lng: String,
}

impl PointInput {
    pub fn new(name: impl Into<String>, lat: impl Into<String>, lng: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lat: lat.into(),
            lng: lng.into(),
        }
    }

    /// Validates the entry, returning the trimmed name and parsed coordinates.
    pub fn parse(&self) -> Result<(String, f64, f64), ValidationError> {
        let name = self.name.trim();
        let lat_text = self.lat.trim();
        let lng_text = self.lng.trim();

        if name.is_empty() || lat_text.is_empty() || lng_text.is_empty() {
            return Err(ValidationError::MissingFields);
        }

        let lat = parse_coordinate("latitude", lat_text)?;
        let lng = parse_coordinate("longitude", lng_text)?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::OutOfRange { lat, lng });
        }

        Ok((name.to_string(), lat, lng))
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.lat.clear();
        self.lng.clear();
    }
}

fn parse_coordinate(field: &'static str, text: &str) -> Result<f64, ValidationError> {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::NotANumber {
            field,
            value: text.to_string(),
        }),
    }
}

/// Demo points offered by the "Examples" button.
pub const EXAMPLE_POINTS: [(&str, f64, f64); 4] = [
    ("Marco Zero - Recife", -8.0631, -34.8711),
    ("Cristo Redentor - Rio de Janeiro", -22.9519, -43.2105),
    ("Mercado Municipal - São Paulo", -23.5431, -46.6291),
    ("Pelourinho - Salvador", -12.9714, -38.5124),
];

/// Ordered list of points.
#[derive(Debug, Clone)]
pub struct PointList {
    points: Vec<Point>,
    next_id: u64,
}

impl Default for PointList {
    fn default() -> Self {
        Self::new()
    }
}

impl PointList {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            next_id: 1,
        }
    }

    /// Validates and appends a point. The list is untouched on error.
    pub fn add(&mut self, input: &PointInput) -> Result<&Point, ValidationError> {
        let (name, lat, lng) = input.parse()?;
        let id = self.next_id;
        self.next_id += 1;

        log::info!("Added point #{} '{}' at ({}, {})", id, name, lat, lng);
        self.points.push(Point { id, name, lat, lng });
        Ok(&self.points[self.points.len() - 1])
    }

    /// Removes the point with the given id, if present.
    pub fn remove(&mut self, id: u64) -> Option<Point> {
        let index = self.points.iter().position(|p| p.id == id)?;
        let removed = self.points.remove(index);
        log::info!("Removed point #{} '{}'", removed.id, removed.name);
        Some(removed)
    }

    /// Appends the demo points, stopping at the first rejected entry.
    pub fn add_examples(&mut self) -> Result<usize, ValidationError> {
        for (name, lat, lng) in EXAMPLE_POINTS {
            self.add(&PointInput::new(name, lat.to_string(), lng.to_string()))?;
        }
        Ok(EXAMPLE_POINTS.len())
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
