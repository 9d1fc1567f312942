//! Request and response values of a route search.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// A WGS84 position. Always within latitude [-90, 90] and longitude [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = InputError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Rejects positions outside the WGS84 range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InputError> {
        let in_range = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        if !in_range {
            return Err(InputError::OutOfRange { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// (lat, lng) tuple, the order used by [`crate::haversine`].
    pub fn as_lat_lng(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Parses the `"lat,lon"` form used by the search endpoint.
impl FromStr for Coordinate {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InputError::InvalidCoordinate(s.to_string());

        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        if lon.contains(',') {
            return Err(invalid());
        }
        let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let longitude: f64 = lon.trim().parse().map_err(|_| invalid())?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(invalid());
        }

        Coordinate::new(latitude, longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// A validated search request. The preference is never blank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    preference: String,
    start: Coordinate,
    end: Coordinate,
}

impl SearchRequest {
    pub fn new(preference: impl Into<String>, start: Coordinate, end: Coordinate) -> Result<Self, InputError> {
        let preference = preference.into();
        if preference.trim().is_empty() {
            return Err(InputError::EmptyPreference);
        }
        Ok(Self { preference, start, end })
    }

    /// Builds a request from raw `q`, `s` and `e` query parameters.
    pub fn from_params(q: Option<&str>, s: Option<&str>, e: Option<&str>) -> Result<Self, InputError> {
        let q = q.ok_or(InputError::MissingParameter("q"))?;
        let s = s.ok_or(InputError::MissingParameter("s"))?;
        let e = e.ok_or(InputError::MissingParameter("e"))?;

        let start = s.parse()?;
        let end = e.parse()?;
        Self::new(q, start, end)
    }

    /// The traveller's free-text preference.
    pub fn preference(&self) -> &str {
        &self.preference
    }

    /// Where the walk starts.
    pub fn start(&self) -> Coordinate {
        self.start
    }

    /// Where the walk ends.
    pub fn end(&self) -> Coordinate {
        self.end
    }
}

/// A point of interest along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDetail {
    pub name: String,
    pub description: String,
    pub location: Coordinate,
}

/// The assembled answer for one search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// The request this answers.
    pub request: SearchRequest,
    /// What the weights prioritised. Empty when it could not be generated.
    pub rationale: String,
    pub title: String,
    pub summary: String,
    /// Route geometry as returned by the routing engine.
    pub route: serde_json::Value,
    pub details: Vec<RouteDetail>,
    pub distance_m: f64,
    pub duration_min: f64,
}
