//! Route lines decoded from the routing engine's GeoJSON payload.
//!
//! Decoding happens at this boundary only; the rest of the pipeline treats
//! route geometry as an opaque payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GeometryError;
use crate::haversine::path_length_m;
use crate::retrieval::RouteGeometry;

/// A polyline representing a route line as decoded coordinates.
///
/// Stores latitude/longitude points directly; the GeoJSON payload is only
/// decoded at the routing engine boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    ///
    /// Each point is a (latitude, longitude) tuple.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    /// Great-circle length in meters.
    pub fn length_m(&self) -> f64 {
        path_length_m(&self.points)
    }

    /// GeoJSON `LineString` coordinates: `[[lon, lat, ...], ...]`.
    fn from_positions(positions: &Value) -> Result<Self, GeometryError> {
        let positions = positions
            .as_array()
            .ok_or_else(|| GeometryError::Malformed("line coordinates are not an array".to_string()))?;
        if positions.is_empty() {
            return Err(GeometryError::Malformed("line has no positions".to_string()));
        }

        let points = positions.iter().map(position).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points })
    }
}

fn position(value: &Value) -> Result<(f64, f64), GeometryError> {
    let malformed = || GeometryError::Malformed(format!("invalid position {value}"));

    let pair = value.as_array().filter(|pair| pair.len() >= 2).ok_or_else(malformed)?;
    let lon = pair[0].as_f64().ok_or_else(malformed)?;
    let lat = pair[1].as_f64().ok_or_else(malformed)?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(malformed());
    }
    Ok((lat, lon))
}

/// Parses the payload, unwrapping one level of string encoding.
pub fn decode_geometry(geometry: &RouteGeometry) -> Result<Value, GeometryError> {
    let value: Value = serde_json::from_str(geometry.as_str())?;
    match value {
        Value::String(inner) => Ok(serde_json::from_str(&inner)?),
        other => Ok(other),
    }
}

/// Every line in a GeoJSON geometry, feature or collection.
///
/// Point geometries inside collections are skipped. A payload without any
/// line is malformed.
pub fn route_lines(value: &Value) -> Result<Vec<Polyline>, GeometryError> {
    let mut lines = Vec::new();
    collect_lines(value, true, &mut lines)?;
    if lines.is_empty() {
        return Err(GeometryError::Malformed("geometry contains no line".to_string()));
    }
    Ok(lines)
}

fn collect_lines(value: &Value, top_level: bool, lines: &mut Vec<Polyline>) -> Result<(), GeometryError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeometryError::Malformed("missing GeoJSON type".to_string()))?;

    match kind {
        "LineString" => {
            lines.push(Polyline::from_positions(coordinates(value)?)?);
        }
        "MultiLineString" => {
            let parts = coordinates(value)?
                .as_array()
                .ok_or_else(|| GeometryError::Malformed("multi-line coordinates are not an array".to_string()))?;
            for part in parts {
                lines.push(Polyline::from_positions(part)?);
            }
        }
        "Feature" => {
            if let Some(geometry) = value.get("geometry").filter(|g| !g.is_null()) {
                collect_lines(geometry, false, lines)?;
            }
        }
        "FeatureCollection" => {
            for feature in members(value, "features")? {
                collect_lines(feature, false, lines)?;
            }
        }
        "GeometryCollection" => {
            for geometry in members(value, "geometries")? {
                collect_lines(geometry, false, lines)?;
            }
        }
        "Point" | "MultiPoint" | "Polygon" | "MultiPolygon" if !top_level => {}
        other => return Err(GeometryError::UnsupportedType(other.to_string())),
    }

    Ok(())
}

fn coordinates(value: &Value) -> Result<&Value, GeometryError> {
    value
        .get("coordinates")
        .ok_or_else(|| GeometryError::Malformed("missing coordinates".to_string()))
}

fn members<'a>(value: &'a Value, key: &str) -> Result<&'a Vec<Value>, GeometryError> {
    value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| GeometryError::Malformed(format!("missing {key} array")))
}
