//! Preference weights for the routing engine.
//!
//! The text-generation service is asked to spread a fixed budget across seven
//! routing criteria. Its answer goes through a strict parser and a pure
//! validator; anything that fails either step is replaced by the uniform
//! distribution, so a [`WeightVector`] is always available.

use std::collections::HashSet;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::traits::TextGenerator;

/// The seven routing criteria, in the order the routing engine expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightDimension {
    Length,
    GreenIndex,
    WaterIndex,
    ShadeIndex,
    SlopeIndex,
    RoadSafety,
    Isolation,
}

impl WeightDimension {
    pub const ALL: [WeightDimension; 7] = [
        WeightDimension::Length,
        WeightDimension::GreenIndex,
        WeightDimension::WaterIndex,
        WeightDimension::ShadeIndex,
        WeightDimension::SlopeIndex,
        WeightDimension::RoadSafety,
        WeightDimension::Isolation,
    ];

    /// Snake-case name without the `weight_` prefix.
    pub fn name(self) -> &'static str {
        match self {
            WeightDimension::Length => "length",
            WeightDimension::GreenIndex => "green_index",
            WeightDimension::WaterIndex => "water_index",
            WeightDimension::ShadeIndex => "shade_index",
            WeightDimension::SlopeIndex => "slope_index",
            WeightDimension::RoadSafety => "road_safety",
            WeightDimension::Isolation => "isolation",
        }
    }

    /// Name of the routing engine parameter carrying this weight.
    pub fn param_name(self) -> String {
        format!("weight_{}", self.name())
    }

    /// Accepts both `green_index` and the engine's `weight_green_index`.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        let key = key.strip_prefix("weight_").unwrap_or(&key);
        Self::ALL.into_iter().find(|dim| dim.name() == key)
    }

    fn index(self) -> usize {
        self as usize
    }

    fn description(self) -> &'static str {
        match self {
            WeightDimension::Length => "reach the destination by the shortest distance or time",
            WeightDimension::GreenIndex => "pass through parks, tree-lined streets and other greenery",
            WeightDimension::WaterIndex => "stay close to rivers, lakes and other waterfronts",
            WeightDimension::ShadeIndex => "walk through shaded, cool areas",
            WeightDimension::SlopeIndex => "avoid slopes and prefer flat, easy walking",
            WeightDimension::RoadSafety => "prefer safe streets with little traffic and other pedestrians around",
            WeightDimension::Isolation => "prefer remote, quiet and calm places",
        }
    }
}

impl fmt::Display for WeightDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Seven non-negative weights summing to `1 - landmarks`, plus the landmark weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightVector {
    values: [f64; 7],
    landmarks: f64,
}

impl WeightVector {
    /// Every dimension gets `(1 - landmarks_weight) / 7`.
    pub fn uniform(landmarks_weight: f64) -> Self {
        let share = (1.0 - landmarks_weight) / WeightDimension::ALL.len() as f64;
        Self {
            values: [share; 7],
            landmarks: landmarks_weight,
        }
    }

    /// Weight of one routing criterion.
    pub fn get(&self, dimension: WeightDimension) -> f64 {
        self.values[dimension.index()]
    }

    /// The fixed landmark weight.
    pub fn landmarks(&self) -> f64 {
        self.landmarks
    }

    /// The share of the total weight distributed across the seven dimensions.
    pub fn budget(&self) -> f64 {
        1.0 - self.landmarks
    }

    /// Sum of the seven criterion weights; equals [`budget`](Self::budget).
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Each criterion with its weight, in engine order.
    pub fn iter(&self) -> impl Iterator<Item = (WeightDimension, f64)> + '_ {
        WeightDimension::ALL.into_iter().map(|dim| (dim, self.get(dim)))
    }
}

impl Serialize for WeightVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(8))?;
        for (dim, value) in self.iter() {
            map.serialize_entry(dim.name(), &value)?;
        }
        map.serialize_entry("landmarks", &self.landmarks)?;
        map.end()
    }
}

/// Why a generated weight list was rejected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WeightParseError {
    #[error("response is empty")]
    Empty,

    #[error("entry {0:?} is not a key=value pair")]
    MissingSeparator(String),

    #[error("unknown weight key {0:?}")]
    UnknownKey(String),

    #[error("weight key {0:?} appears more than once")]
    DuplicateKey(String),

    #[error("value for {key:?} is not a number: {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("value for {key:?} is negative or not finite: {value}")]
    OutOfRange { key: String, value: f64 },

    #[error("weights sum to {sum}, expected {expected}")]
    SumMismatch { sum: f64, expected: f64 },
}

/// Weights as read from the generator, before budget validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedWeights {
    entries: Vec<(WeightDimension, f64)>,
}

impl ParsedWeights {
    /// Parsed pairs in the order they appeared.
    pub fn entries(&self) -> &[(WeightDimension, f64)] {
        &self.entries
    }

    /// Sum of the parsed values.
    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, value)| value).sum()
    }
}

/// Parses a comma-separated `key=value` list.
///
/// Every key must name a [`WeightDimension`] (with or without the `weight_`
/// prefix), appear at most once and carry a finite, non-negative number.
pub fn parse_weights(text: &str) -> Result<ParsedWeights, WeightParseError> {
    let text = text.trim().trim_end_matches('.');
    if text.is_empty() {
        return Err(WeightParseError::Empty);
    }

    let mut entries = Vec::with_capacity(WeightDimension::ALL.len());
    let mut seen = HashSet::new();

    for part in text.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| WeightParseError::MissingSeparator(part.to_string()))?;
        let key = key.trim();
        let value = value.trim();

        let dimension = WeightDimension::from_key(key).ok_or_else(|| WeightParseError::UnknownKey(key.to_string()))?;
        if !seen.insert(dimension) {
            return Err(WeightParseError::DuplicateKey(key.to_string()));
        }

        let number: f64 = value.parse().map_err(|_| WeightParseError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        if !number.is_finite() || number < 0.0 {
            return Err(WeightParseError::OutOfRange {
                key: key.to_string(),
                value: number,
            });
        }

        entries.push((dimension, number));
    }

    if entries.is_empty() {
        return Err(WeightParseError::Empty);
    }

    Ok(ParsedWeights { entries })
}

/// Checks the parsed weights against the budget and builds the vector.
///
/// Dimensions the generator left out get zero weight. A sum within
/// `tolerance` of the budget is rescaled so the invariant holds exactly.
pub fn validate_weights(
    parsed: &ParsedWeights,
    landmarks_weight: f64,
    tolerance: f64,
) -> Result<WeightVector, WeightParseError> {
    let expected = 1.0 - landmarks_weight;
    let sum = parsed.sum();
    if (sum - expected).abs() > tolerance || sum <= 0.0 {
        return Err(WeightParseError::SumMismatch { sum, expected });
    }

    let scale = expected / sum;
    let mut values = [0.0; 7];
    for &(dimension, value) in parsed.entries() {
        values[dimension.index()] = value * scale;
    }

    Ok(WeightVector {
        values,
        landmarks: landmarks_weight,
    })
}

/// Turns a free-text preference into a [`WeightVector`].
#[derive(Debug, Clone)]
pub struct WeightResolver {
    landmarks_weight: f64,
    tolerance: f64,
}

impl WeightResolver {
    /// `landmarks_weight` is removed from the budget before distribution.
    pub fn new(landmarks_weight: f64, tolerance: f64) -> Self {
        Self {
            landmarks_weight,
            tolerance,
        }
    }

    /// Never fails: generator errors and rejected answers fall back to
    /// [`WeightVector::uniform`].
    pub fn resolve<G: TextGenerator + ?Sized>(&self, generator: &G, preference: &str) -> WeightVector {
        let prompt = self.prompt(preference);

        let response = match generator.generate(&prompt) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "weight generation failed, using uniform weights");
                return WeightVector::uniform(self.landmarks_weight);
            }
        };

        match parse_weights(&response).and_then(|parsed| validate_weights(&parsed, self.landmarks_weight, self.tolerance)) {
            Ok(weights) => {
                tracing::debug!(?weights, "resolved preference weights");
                weights
            }
            Err(err) => {
                tracing::warn!(error = %err, response = %response, "rejected generated weights, using uniform weights");
                WeightVector::uniform(self.landmarks_weight)
            }
        }
    }

    /// The instruction sent to the text-generation service.
    pub fn prompt(&self, preference: &str) -> String {
        let budget = 1.0 - self.landmarks_weight;
        let avg = budget / WeightDimension::ALL.len() as f64;

        let criteria = WeightDimension::ALL
            .iter()
            .map(|dim| format!("- {}: {}", dim.param_name(), dim.description()))
            .collect::<Vec<_>>()
            .join("\n");

        let uniform = WeightDimension::ALL
            .iter()
            .map(|dim| format!("{}={}", dim.param_name(), avg))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"Decide how much each of the following walking route criteria matters for the traveller's preference.

Criteria:
{criteria}

Rules:
- Output only the seven weights as a single comma-separated line of key=value pairs.
- Each weight is a decimal number between 0 and {budget}.
- The seven weights must sum to exactly {budget}.
- A weight of 0 ignores the criterion; a weight of {budget} considers only that criterion.

Examples:
1. {uniform}
2. weight_length={two}, weight_green_index={two}, weight_water_index=0.0, weight_shade_index=0.0, weight_slope_index=0.0, weight_road_safety={three}, weight_isolation=0.0

Preference:
{preference}"#,
            two = avg * 2.0,
            three = avg * 3.0,
        )
    }
}
