//! Route retrieval from the routing engine.

use serde::Serialize;

use crate::error::EngineError;
use crate::landmarks::LandmarkSet;
use crate::model::Coordinate;
use crate::retry::RetryPolicy;
use crate::traits::RoutingEngine;
use crate::weights::WeightVector;

/// Serialized geometry returned by the routing engine.
///
/// Opaque to the pipeline apart from distance measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGeometry(String);

impl RouteGeometry {
    /// Wraps a payload exactly as the engine returned it.
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// Returns the payload text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the geometry and returns the owned payload.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Parameters of the routing engine's stored call.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub weights: WeightVector,
    pub landmarks: LandmarkSet,
    pub start: Coordinate,
    pub end: Coordinate,
}

/// The named parameters of `generate_route`, in call order.
#[derive(Debug, Serialize)]
pub struct RouteParams<'a> {
    pub weight_length: f64,
    pub weight_green_index: f64,
    pub weight_water_index: f64,
    pub weight_shade_index: f64,
    pub weight_slope_index: f64,
    pub weight_road_safety: f64,
    pub weight_isolation: f64,
    pub weight_landmarks: f64,
    pub landmarks: &'a [String],
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
}

impl RouteRequest {
    pub fn params(&self) -> RouteParams<'_> {
        use crate::weights::WeightDimension as D;

        RouteParams {
            weight_length: self.weights.get(D::Length),
            weight_green_index: self.weights.get(D::GreenIndex),
            weight_water_index: self.weights.get(D::WaterIndex),
            weight_shade_index: self.weights.get(D::ShadeIndex),
            weight_slope_index: self.weights.get(D::SlopeIndex),
            weight_road_safety: self.weights.get(D::RoadSafety),
            weight_isolation: self.weights.get(D::Isolation),
            weight_landmarks: self.weights.landmarks(),
            landmarks: self.landmarks.terms(),
            start_lat: self.start.latitude(),
            start_lon: self.start.longitude(),
            end_lat: self.end.latitude(),
            end_lon: self.end.longitude(),
        }
    }
}

/// One result row of the stored call. Column 0 is the route, column 1 the
/// optional landmark geometry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteRow {
    columns: Vec<Option<String>>,
}

impl RouteRow {
    pub fn new(columns: Vec<Option<String>>) -> Self {
        Self { columns }
    }

    /// The route geometry, if the column is present and not blank.
    pub fn route(&self) -> Option<&str> {
        self.column(0)
    }

    /// The landmark geometry, if the engine returned one.
    pub fn landmarks(&self) -> Option<&str> {
        self.column(1)
    }

    fn column(&self, index: usize) -> Option<&str> {
        self.columns
            .get(index)
            .and_then(|value| value.as_deref())
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedRoute {
    pub route: RouteGeometry,
    pub landmarks: Option<RouteGeometry>,
}

/// Calls the routing engine, retrying on errors and empty results.
#[derive(Debug, Clone)]
pub struct RouteRetriever {
    policy: RetryPolicy,
}

impl RouteRetriever {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Returns the last engine error once every attempt has failed.
    pub fn retrieve<E: RoutingEngine + ?Sized>(
        &self,
        engine: &E,
        request: &RouteRequest,
    ) -> Result<RetrievedRoute, EngineError> {
        self.policy.run("generate_route", |attempt| {
            tracing::debug!(attempt, start = %request.start, end = %request.end, "calling routing engine");
            let row = engine.generate_route(request)?.ok_or(EngineError::NoRoute)?;
            let route = row.route().ok_or(EngineError::NoRoute)?;

            Ok(RetrievedRoute {
                route: RouteGeometry::new(route),
                landmarks: row.landmarks().map(RouteGeometry::new),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn request() -> RouteRequest {
        RouteRequest {
            weights: WeightVector::uniform(0.2),
            landmarks: LandmarkSet::empty(),
            start: Coordinate::new(35.68, 139.76).unwrap(),
            end: Coordinate::new(35.69, 139.77).unwrap(),
        }
    }

    /// Replays scripted responses, repeating the last one.
    struct Scripted {
        responses: Mutex<Vec<Result<Option<RouteRow>, EngineError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(mut responses: Vec<Result<Option<RouteRow>, EngineError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RoutingEngine for Scripted {
        fn generate_route(&self, _request: &RouteRequest) -> Result<Option<RouteRow>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(EngineError::Other("script exhausted".to_string())))
        }
    }

    fn row(route: &str, landmarks: Option<&str>) -> RouteRow {
        RouteRow::new(vec![Some(route.to_string()), landmarks.map(str::to_string)])
    }

    #[test]
    fn test_params_follow_weights() {
        let req = request();
        let params = req.params();
        assert!((params.weight_length - 0.8 / 7.0).abs() < 1e-12);
        assert_eq!(params.weight_landmarks, 0.2);
        assert_eq!(params.start_lat, 35.68);
        assert_eq!(params.end_lon, 139.77);

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 13);
    }

    #[test]
    fn test_row_columns() {
        let r = row("{}", None);
        assert_eq!(r.route(), Some("{}"));
        assert_eq!(r.landmarks(), None);
        assert_eq!(RouteRow::new(vec![Some("  ".to_string())]).route(), None);
        assert_eq!(RouteRow::default().route(), None);
    }

    #[test]
    fn test_retrieve_first_attempt() {
        let engine = Scripted::new(vec![Ok(Some(row("route", Some("marks"))))]);
        let retrieved = RouteRetriever::new(RetryPolicy::immediate(5))
            .retrieve(&engine, &request())
            .unwrap();
        assert_eq!(retrieved.route.as_str(), "route");
        assert_eq!(retrieved.landmarks, Some(RouteGeometry::new("marks")));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retrieve_recovers_after_failures() {
        let engine = Scripted::new(vec![
            Err(EngineError::Other("connection reset".to_string())),
            Ok(None),
            Ok(Some(RouteRow::new(vec![None]))),
            Ok(Some(row("route", None))),
        ]);
        let retrieved = RouteRetriever::new(RetryPolicy::immediate(5))
            .retrieve(&engine, &request())
            .unwrap();
        assert_eq!(retrieved.route.as_str(), "route");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_retrieve_raises_last_error() {
        let engine = Scripted::new(vec![
            Ok(None),
            Ok(None),
            Ok(None),
            Ok(None),
            Err(EngineError::Other("final failure".to_string())),
        ]);
        let err = RouteRetriever::new(RetryPolicy::immediate(5))
            .retrieve(&engine, &request())
            .unwrap_err();
        assert_eq!(err.to_string(), "final failure");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 5);
    }
}
