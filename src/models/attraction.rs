//! Points of interest returned by the places lookup

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Kind of POI searched for around a place
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PoiCategory {
    Tourism,
    Food,
    Accommodation,
}

impl PoiCategory {
    /// Tag reported for an element that carries none of the known keys
    #[must_use]
    pub fn default_tag(self) -> &'static str {
        match self {
            PoiCategory::Tourism => "attraction",
            PoiCategory::Food => "restaurant",
            PoiCategory::Accommodation => "hotel",
        }
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PoiCategory::Tourism => "tourism",
            PoiCategory::Food => "food",
            PoiCategory::Accommodation => "accommodation",
        };
        f.write_str(name)
    }
}

/// A named place near the resolved location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attraction {
    pub name: String,
    pub coordinates: Coordinates,
    /// Upstream feature tag, e.g. "museum", "restaurant", "hotel"
    pub category_tag: String,
    pub address: Option<String>,
    pub photo_url: Option<String>,
    /// Distance from the resolved place centre
    pub distance_km: Option<f64>,
}

impl Attraction {
    #[must_use]
    pub fn new(name: impl Into<String>, coordinates: Coordinates, category_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coordinates,
            category_tag: category_tag.into(),
            address: None,
            photo_url: None,
            distance_km: None,
        }
    }
}

/// Drop every attraction whose name was already seen, keeping discovery order.
#[must_use]
pub fn dedup_by_name(attractions: Vec<Attraction>) -> Vec<Attraction> {
    let mut seen = HashSet::new();
    attractions
        .into_iter()
        .filter(|attraction| seen.insert(attraction.name.clone()))
        .collect()
}
