//! Error taxonomy for the route search pipeline.
//!
//! Input errors are rejected before the pipeline runs. Weight and landmark
//! failures never appear here because they degrade to defaults. Everything
//! reachable from [`SearchError`] aborts the request.

use std::time::Duration;

use thiserror::Error;

/// Malformed search parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("missing query parameter: {0}")]
    MissingParameter(&'static str),

    #[error("preference text is empty")]
    EmptyPreference,

    #[error("invalid coordinate: {0:?}")]
    InvalidCoordinate(String),

    #[error("coordinate out of range: latitude {latitude}, longitude {longitude}")]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// Failure talking to the text-generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("text generation service error (HTTP {status}): {body}")]
    Service { status: u16, body: String },

    #[error("text generation service returned no content")]
    EmptyResponse,

    #[error("{0}")]
    Other(String),
}

/// Failure talking to the routing engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("routing engine error (HTTP {status}): {body}")]
    Service { status: u16, body: String },

    #[error("routing engine response could not be decoded: {0}")]
    Decode(String),

    #[error("routing engine returned no route")]
    NoRoute,

    #[error("{0}")]
    Other(String),
}

/// Route geometry that cannot be measured.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("route geometry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported geometry type: {0}")]
    UnsupportedType(String),

    #[error("malformed geometry: {0}")]
    Malformed(String),
}

/// Failure producing an accepted route explanation.
#[derive(Debug, Error)]
pub enum ExplanationError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("explanation is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("explanation violates schema: {0}")]
    Schema(String),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Hard failure of a search request.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("route retrieval failed: {0}")]
    Route(#[from] EngineError),

    #[error("route geometry rejected: {0}")]
    Geometry(#[from] GeometryError),

    #[error("route explanation failed: {0}")]
    Explanation(#[from] ExplanationError),

    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    #[error("search worker exited before producing a result")]
    WorkerLost,
}

impl SearchError {
    /// True when the caller supplied bad parameters (HTTP 400 class).
    pub fn is_input_error(&self) -> bool {
        matches!(self, SearchError::Input(_))
    }
}
