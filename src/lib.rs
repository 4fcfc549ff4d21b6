//! `TourGuide` - tourism information for a place or a free-text travel query
//!
//! A query is classified into a place and an intent, the place is geocoded,
//! and weather, nearby places, photos and generated narrative are gathered
//! concurrently before being rendered by intent.

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod intent;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use clients::Collaborators;
pub use config::TourGuideConfig;
pub use error::TourGuideError;
pub use intent::{Classification, classify};
pub use models::{Attraction, Intent, NarrativeContent, PlaceInfo, QueryResult, WeatherSnapshot};
pub use orchestrator::{Orchestrator, OrchestratorSettings};
pub use render::{render, render_narrative};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TourGuideError>;
