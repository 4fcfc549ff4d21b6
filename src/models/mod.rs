//! Data models for the TourGuide application
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates, geocoder matches and the resolved place
//! - Weather: current conditions snapshot
//! - Attraction: points of interest and their categories
//! - Query: intent, narrative content and the aggregate query result

pub mod attraction;
pub mod location;
pub mod query;
pub mod weather;

// Re-export all public types for convenient access
pub use attraction::{Attraction, PoiCategory, dedup_by_name};
pub use location::{Coordinates, GeocodeMatch, PlaceInfo};
pub use query::{Intent, NarrativeContent, NarrativeContext, NarrativeKind, QueryResult};
pub use weather::WeatherSnapshot;
