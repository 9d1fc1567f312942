//! Test fixtures for route-finder.
//!
//! Provides realistic test data including:
//! - Real central Tokyo locations (from OpenStreetMap)
//! - GeoJSON and explanation builders
//! - Scripted text-generation and routing-engine doubles

#![allow(dead_code)]

pub mod doubles;
pub mod tokyo_locations;

pub use doubles::*;
pub use tokyo_locations::*;
