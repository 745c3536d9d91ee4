//! # Earshot Common Library
//!
//! Shared code for the Earshot guide engine:
//! - Geographic types and great-circle distance
//! - Event types (EarshotEvent enum) and EventBus
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod geo;

pub use error::{Error, Result};
pub use geo::GeoPoint;
