//! Query intent and the aggregate result record

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Attraction, PlaceInfo, PoiCategory, WeatherSnapshot};

/// Classified purpose of a query
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Weather,
    PlanTrip,
    Food,
    Accommodation,
    #[default]
    Combined,
}

impl Intent {
    /// Category of POI fetched for this intent
    #[must_use]
    pub fn poi_category(self) -> PoiCategory {
        match self {
            Intent::Food => PoiCategory::Food,
            Intent::Accommodation => PoiCategory::Accommodation,
            Intent::Weather | Intent::PlanTrip | Intent::Combined => PoiCategory::Tourism,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Weather => "weather",
            Intent::PlanTrip => "plan_trip",
            Intent::Food => "food",
            Intent::Accommodation => "accommodation",
            Intent::Combined => "combined",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of generated narrative
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeKind {
    Summary,
    Tips,
    Itinerary,
}

impl fmt::Display for NarrativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NarrativeKind::Summary => "summary",
            NarrativeKind::Tips => "tips",
            NarrativeKind::Itinerary => "itinerary",
        };
        f.write_str(name)
    }
}

/// What the generative backend is told about a place
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeContext {
    /// Display name of the place
    pub place: String,
    /// The traveller's raw query
    pub query: String,
    pub weather: Option<WeatherSnapshot>,
    /// Attraction names in discovery order
    pub attractions: Vec<String>,
}

/// Generated text; each field is independently absent when the backend was
/// disabled, failed or missed its deadline.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NarrativeContent {
    pub summary: Option<String>,
    pub travel_tips: Option<String>,
    pub itinerary: Option<String>,
}

impl NarrativeContent {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.travel_tips.is_none() && self.itinerary.is_none()
    }
}

/// Everything gathered for one query.
///
/// `success == false` implies `place`, `weather` are `None` and
/// `attractions` is empty. `intent` is always set.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QueryResult {
    pub success: bool,
    pub error_message: Option<String>,
    pub intent: Intent,
    pub place: Option<PlaceInfo>,
    pub weather: Option<WeatherSnapshot>,
    pub attractions: Vec<Attraction>,
    pub narrative: NarrativeContent,
}

impl QueryResult {
    /// A failed query: only the intent and the user-facing message survive
    #[must_use]
    pub fn failure(intent: Intent, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            intent,
            place: None,
            weather: None,
            attractions: Vec::new(),
            narrative: NarrativeContent::default(),
        }
    }

    #[must_use]
    pub fn success(
        intent: Intent,
        place: PlaceInfo,
        weather: Option<WeatherSnapshot>,
        attractions: Vec<Attraction>,
        narrative: NarrativeContent,
    ) -> Self {
        Self {
            success: true,
            error_message: None,
            intent,
            place: Some(place),
            weather,
            attractions,
            narrative,
        }
    }
}
