//! Seams to the two external collaborators of the pipeline.
//!
//! Both are blocking request/response calls. Concrete adapters live in
//! [`crate::chat`] and [`crate::postgrest`]; tests provide scripted doubles.

use crate::error::{EngineError, GenerationError};
use crate::retrieval::{RouteRequest, RouteRow};

/// A text-generation service: prompt in, untrusted free-form text out.
///
/// Nothing about the returned text is guaranteed. Callers must parse and
/// validate it before use.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// The routing engine's single stored call.
///
/// Returns the first result row, or `None` when the call produced no rows.
pub trait RoutingEngine: Send + Sync {
    fn generate_route(&self, request: &RouteRequest) -> Result<Option<RouteRow>, EngineError>;
}
