//! Nominatim (OpenStreetMap) geocoding and reverse geocoding

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::http::{HttpTransport, endpoint};
use super::{AddressProvider, Geocoder};
use crate::models::{Coordinates, GeocodeMatch};

pub struct NominatimClient {
    transport: HttpTransport,
    base_url: String,
    importance_margin: f64,
    candidate_limit: u32,
}

/// One `/search` candidate
#[derive(Debug, Deserialize)]
struct SearchCandidate {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(rename = "type", default)]
    place_type: Option<String>,
}

/// `/reverse` response; `error` is set instead of a name when nothing is there
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl SearchCandidate {
    fn into_match(self) -> Option<GeocodeMatch> {
        let latitude = self.lat.trim().parse::<f64>().ok()?;
        let longitude = self.lon.trim().parse::<f64>().ok()?;
        Some(GeocodeMatch {
            coordinates: Coordinates::new(latitude, longitude),
            display_name: self.display_name,
            place_type: self.place_type,
            importance: self.importance.unwrap_or(0.0),
        })
    }
}

impl NominatimClient {
    pub fn new(
        transport: HttpTransport,
        base_url: String,
        importance_margin: f64,
        candidate_limit: u32,
    ) -> Self {
        Self {
            transport,
            base_url,
            importance_margin,
            candidate_limit,
        }
    }
}

/// Choose among gazetteer candidates.
///
/// The first candidate wins unless a later one's importance exceeds the
/// current best by more than `margin` (0.2 = 20%). Scanning continues from
/// each new best.
#[must_use]
pub fn pick_best_candidate(candidates: &[GeocodeMatch], margin: f64) -> Option<&GeocodeMatch> {
    let (first, rest) = candidates.split_first()?;
    Some(rest.iter().fold(first, |best, candidate| {
        if candidate.importance > best.importance * (1.0 + margin) {
            candidate
        } else {
            best
        }
    }))
}

#[async_trait]
impl Geocoder for NominatimClient {
    #[instrument(skip(self), fields(place = place))]
    async fn geocode(&self, place: &str) -> Result<Option<GeocodeMatch>> {
        let place = place.trim();
        if place.is_empty() {
            return Ok(None);
        }

        info!("Geocoding location: '{}'", place);

        let url = endpoint(
            &self.base_url,
            "search",
            &[
                ("q", place.to_string()),
                ("format", "json".to_string()),
                ("limit", self.candidate_limit.to_string()),
                ("accept-language", "en".to_string()),
                ("addressdetails", "1".to_string()),
            ],
        )?;

        let candidates: Vec<SearchCandidate> = self.transport.get_json("nominatim", url).await?;
        let matches: Vec<GeocodeMatch> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let name = candidate.display_name.clone();
                let parsed = candidate.into_match();
                if parsed.is_none() {
                    warn!("Skipping candidate '{}' with unparsable coordinates", name);
                }
                parsed
            })
            .collect();

        let best = pick_best_candidate(&matches, self.importance_margin).cloned();
        match &best {
            Some(found) => debug!(
                "Geocoded '{}' to {} ({})",
                place,
                found.display_name,
                found.coordinates.format_coordinates()
            ),
            None => warn!("No results found for location '{}'", place),
        }

        Ok(best)
    }
}

#[async_trait]
impl AddressProvider for NominatimClient {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn address(&self, coordinates: Coordinates) -> Result<Option<String>> {
        let url = endpoint(
            &self.base_url,
            "reverse",
            &[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("format", "json".to_string()),
                ("accept-language", "en".to_string()),
            ],
        )?;

        let response: ReverseResponse = self.transport.get_json("nominatim", url).await?;
        if let Some(error) = &response.error {
            debug!("Reverse geocoding found nothing: {}", error);
        }
        Ok(response.display_name.filter(|name| !name.trim().is_empty()))
    }
}
