//! Location model for geographic coordinates and resolved places

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another point in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let from = HaversineLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let to = HaversineLocation {
            latitude: other.latitude,
            longitude: other.longitude,
        };
        distance(from, to, Units::Kilometers)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Best geocoder candidate for a place name
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub coordinates: Coordinates,
    /// The gazetteer's canonical name, e.g. "Bengaluru, Bangalore North, Karnataka, India"
    pub display_name: String,
    /// Gazetteer feature type ("city", "administrative", ...)
    pub place_type: Option<String>,
    /// Relative importance reported by the gazetteer
    pub importance: f64,
}

/// The place a query resolved to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlaceInfo {
    /// Title-cased form of what the user typed
    pub display_name: String,
    /// Canonical name reported by the geocoder
    pub resolved_name: String,
    pub coordinates: Coordinates,
    pub photo_url: Option<String>,
}
