//! route-finder: walking routes from free-text preferences.
//!
//! A preference such as "a quiet route with lots of greenery" is turned into
//! routing weights and landmark categories by a text-generation service, the
//! routing engine computes a route, and the same service explains both the
//! route and what the weights prioritised.

pub mod traits;
pub mod error;
pub mod config;
pub mod model;
pub mod weights;
pub mod vocabulary;
pub mod landmarks;
pub mod rationale;
pub mod retry;
pub mod retrieval;
pub mod haversine;
pub mod polyline;
pub mod metrics;
pub mod explanation;
pub mod search;
pub mod chat;
pub mod postgrest;

pub use error::{SearchError, InputError};
pub use model::{Coordinate, SearchRequest, SearchResult};
pub use search::SearchOrchestrator;
