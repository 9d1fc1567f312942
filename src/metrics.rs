//! Distance and walking time of a route.

use serde::Serialize;
use serde_json::Value;

use crate::error::GeometryError;
use crate::polyline::{decode_geometry, route_lines};
use crate::retrieval::RouteGeometry;

/// Assumed walking speed in meters per second.
pub const DEFAULT_WALKING_SPEED_MPS: f64 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteMetrics {
    pub distance_m: f64,
    /// Whole minutes, rounded to nearest.
    pub duration_min: f64,
}

#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    walking_speed_mps: f64,
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self {
            walking_speed_mps: DEFAULT_WALKING_SPEED_MPS,
        }
    }
}

impl MetricsCalculator {
    pub fn new(walking_speed_mps: f64) -> Self {
        Self { walking_speed_mps }
    }

    pub fn compute(&self, geometry: &RouteGeometry) -> Result<RouteMetrics, GeometryError> {
        self.measure(&decode_geometry(geometry)?)
    }

    /// Same as [`compute`](Self::compute) for an already decoded payload.
    pub fn measure(&self, geometry: &Value) -> Result<RouteMetrics, GeometryError> {
        let distance_m: f64 = route_lines(geometry)?.iter().map(|line| line.length_m()).sum();
        Ok(RouteMetrics {
            distance_m,
            duration_min: self.duration_min(distance_m),
        })
    }

    pub fn duration_min(&self, distance_m: f64) -> f64 {
        (distance_m / self.walking_speed_mps / 60.0).round()
    }
}
