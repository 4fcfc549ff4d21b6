//! Query orchestration
//!
//! One call to [`Orchestrator::process`] runs the whole pipeline for a query:
//!
//! 1. classify the query into a place and an [`Intent`](crate::models::Intent)
//! 2. geocode the place (the only fatal step)
//! 3. fetch the place photo, current weather and nearby places together
//! 4. enrich each attraction with a photo and an address, at most
//!    `photo_concurrency` attractions at a time
//! 5. generate summary, tips and itinerary together, each under its own
//!    deadline
//!
//! Every stage runs against one overall query deadline. Anything except the
//! geocode that fails or runs out of time is dropped from the result.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use futures::{StreamExt, stream};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};

use crate::TourGuideError;
use crate::clients::{Collaborators, PlacesQuery, TextGenerator};
use crate::config::TourGuideConfig;
use crate::intent::{Classification, classify};
use crate::models::{
    Attraction, Coordinates, GeocodeMatch, NarrativeContent, NarrativeContext, NarrativeKind,
    PlaceInfo, QueryResult, dedup_by_name,
};

/// Message returned when the place cannot be geocoded
pub const UNKNOWN_PLACE: &str = "I don't know this place.";

/// Limits and deadlines applied to every query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorSettings {
    pub search_radius_m: u32,
    pub attraction_limit: usize,
    pub photo_concurrency: usize,
    pub narrative_timeout: Duration,
    pub query_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            search_radius_m: 20_000,
            attraction_limit: 5,
            photo_concurrency: 5,
            narrative_timeout: Duration::from_secs(5),
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&TourGuideConfig> for OrchestratorSettings {
    fn from(config: &TourGuideConfig) -> Self {
        Self {
            search_radius_m: config.places.search_radius_m,
            attraction_limit: config.orchestrator.attraction_limit,
            photo_concurrency: config.orchestrator.photo_concurrency,
            narrative_timeout: config.generative.call_timeout(),
            query_timeout: config.orchestrator.query_timeout(),
        }
    }
}

pub struct Orchestrator {
    collaborators: Collaborators,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, settings: OrchestratorSettings) -> Self {
        Self {
            collaborators,
            settings,
        }
    }

    /// Wire the HTTP collaborators and limits described by `config`
    pub fn from_config(config: &TourGuideConfig) -> Result<Self> {
        Ok(Self::new(
            Collaborators::from_config(config)?,
            OrchestratorSettings::from(config),
        ))
    }

    #[must_use]
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Default attraction limit for front ends that don't pick one
    #[must_use]
    pub fn attraction_limit(&self) -> usize {
        self.settings.attraction_limit
    }

    /// Run the full pipeline for one query. Never fails: an unknown place
    /// yields an unsuccessful [`QueryResult`], everything else degrades.
    #[instrument(skip(self), fields(query = query))]
    pub async fn process(&self, query: &str, attraction_limit: usize) -> QueryResult {
        let started = Instant::now();
        let deadline = started + self.settings.query_timeout;

        let Classification { place, intent } = classify(query);
        info!("Classified query: place='{}', intent={}", place, intent);

        let Some(geocoded) = self.geocode(&place, deadline).await else {
            return QueryResult::failure(intent, UNKNOWN_PLACE);
        };

        let display_name = title_case(&place);
        let center = geocoded.coordinates;
        let places_query = PlacesQuery {
            center,
            radius_m: self.settings.search_radius_m,
            limit: attraction_limit,
            category: intent.poi_category(),
        };

        let (place_photo, weather, found) = tokio::join!(
            degrade(
                "place photo",
                deadline,
                self.collaborators.photos.photo(&display_name)
            ),
            degrade(
                "weather",
                deadline,
                self.collaborators.weather.current_weather(center)
            ),
            degrade(
                "places",
                deadline,
                self.collaborators.places.places(&places_query)
            ),
        );
        let place_photo = place_photo.flatten();
        let weather = weather.flatten();

        let mut attractions = dedup_by_name(found.unwrap_or_default());
        attractions.truncate(attraction_limit);
        debug!("Enriching {} attractions", attractions.len());

        let attractions = self
            .enrich_attractions(attractions, &display_name, center, deadline)
            .await;

        let narrative = match &self.collaborators.text {
            Some(text) => {
                let context = NarrativeContext {
                    place: display_name.clone(),
                    query: query.trim().to_string(),
                    weather: weather.clone(),
                    attractions: attractions.iter().map(|a| a.name.clone()).collect(),
                };
                self.narrate(text.as_ref(), &context, deadline).await
            }
            None => NarrativeContent::default(),
        };

        let place_info = PlaceInfo {
            display_name,
            resolved_name: geocoded.display_name,
            coordinates: center,
            photo_url: place_photo,
        };

        info!(
            "Query processed in {:.3}s: {} attractions, weather {}",
            started.elapsed().as_secs_f64(),
            attractions.len(),
            if weather.is_some() { "available" } else { "unavailable" }
        );

        QueryResult::success(intent, place_info, weather, attractions, narrative)
    }

    async fn geocode(&self, place: &str, deadline: Instant) -> Option<GeocodeMatch> {
        match within_deadline("geocoding", deadline, self.collaborators.geocoder.geocode(place)).await {
            Ok(Some(found)) => Some(found),
            Ok(None) => {
                warn!("No geocoding match for '{}'", place);
                None
            }
            Err(e) => {
                warn!("Geocoding '{}' failed: {:#}", place, e);
                None
            }
        }
    }

    /// Attach distance, photo and address to every attraction, keeping order
    async fn enrich_attractions(
        &self,
        attractions: Vec<Attraction>,
        place: &str,
        center: Coordinates,
        deadline: Instant,
    ) -> Vec<Attraction> {
        if attractions.is_empty() {
            return attractions;
        }

        stream::iter(attractions)
            .map(|attraction| self.enrich(attraction, place, center, deadline))
            .buffered(self.settings.photo_concurrency.max(1))
            .collect()
            .await
    }

    async fn enrich(
        &self,
        mut attraction: Attraction,
        place: &str,
        center: Coordinates,
        deadline: Instant,
    ) -> Attraction {
        let coordinates = attraction.coordinates;
        attraction.distance_km = Some(center.distance_km(&coordinates));

        let photo_query = format!("{} {}", attraction.name, place);
        let photo_lookup = degrade(
            "attraction photo",
            deadline,
            self.collaborators.photos.photo(photo_query.trim()),
        );
        let address_lookup = async {
            match &self.collaborators.addresses {
                Some(addresses) => degrade("address", deadline, addresses.address(coordinates))
                    .await
                    .flatten(),
                None => None,
            }
        };

        let (photo_url, address) = tokio::join!(photo_lookup, address_lookup);
        attraction.photo_url = photo_url.flatten();
        attraction.address = address;
        attraction
    }

    async fn narrate(
        &self,
        text: &dyn TextGenerator,
        context: &NarrativeContext,
        query_deadline: Instant,
    ) -> NarrativeContent {
        let deadline = (Instant::now() + self.settings.narrative_timeout).min(query_deadline);

        let (summary, travel_tips, itinerary) = tokio::join!(
            degrade(
                "summary",
                deadline,
                text.generate(NarrativeKind::Summary, context)
            ),
            degrade("tips", deadline, text.generate(NarrativeKind::Tips, context)),
            degrade(
                "itinerary",
                deadline,
                text.generate(NarrativeKind::Itinerary, context)
            ),
        );

        NarrativeContent {
            summary: summary.flatten(),
            travel_tips: travel_tips.flatten(),
            itinerary: itinerary.flatten(),
        }
    }
}

/// Await a collaborator call, turning errors and deadline expiry into `None`
async fn degrade<T, F>(stage: &'static str, deadline: Instant, call: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    within_deadline(stage, deadline, call)
        .await
        .inspect_err(|e| warn!("{} lookup failed: {:#}", stage, e))
        .ok()
}

/// Await a collaborator call, failing with [`TourGuideError::Timeout`] once `deadline` passes
async fn within_deadline<T, F>(stage: &'static str, deadline: Instant, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    timeout_at(deadline, call)
        .await
        .map_err(|_| TourGuideError::timeout(format!("{stage} ran past its deadline")))?
}

/// Capitalize the first letter of every alphabetic run and lowercase the rest
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            titled.push(c);
            in_word = false;
        }
    }
    titled
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("bangalore", "Bangalore")]
    #[case("new york", "New York")]
    #[case("SAN FRANCISCO", "San Francisco")]
    #[case("o'hare", "O'Hare")]
    #[case("são paulo", "São Paulo")]
    #[case("rio-de-janeiro", "Rio-De-Janeiro")]
    #[case("", "")]
    fn test_title_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(title_case(input), expected);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = TourGuideConfig::default();
        config.orchestrator.photo_concurrency = 2;
        config.generative.call_timeout_seconds = 7;

        let settings = OrchestratorSettings::from(&config);
        assert_eq!(settings.photo_concurrency, 2);
        assert_eq!(settings.narrative_timeout, Duration::from_secs(7));
        assert_eq!(settings.search_radius_m, 20_000);
        assert_eq!(settings.query_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_degrade_maps_errors_to_none() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let ok = degrade("ok", deadline, async { Ok::<_, anyhow::Error>(3) }).await;
        assert_eq!(ok, Some(3));

        let failed = degrade("failed", deadline, async {
            Err::<u8, _>(anyhow::anyhow!("boom"))
        })
        .await;
        assert_eq!(failed, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_degrade_respects_deadline() {
        let deadline = Instant::now() + Duration::from_millis(50);
        let late = degrade("late", deadline, async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, anyhow::Error>(1)
        })
        .await;
        assert_eq!(late, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_is_a_timeout_error() {
        let deadline = Instant::now() + Duration::from_millis(50);
        let err = within_deadline("weather", deadline, async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, anyhow::Error>(1)
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TourGuideError>(),
            Some(TourGuideError::Timeout { .. })
        ));
        assert_eq!(err.to_string(), "Timed out: weather ran past its deadline");
    }
}
