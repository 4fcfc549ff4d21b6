//! Collaborator clients
//!
//! Each external data source sits behind a narrow async trait so the
//! orchestrator can be driven by the HTTP clients in this module or by
//! in-memory implementations. Implementations report failures as `Err`;
//! turning those into absent values is the caller's job.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::TourGuideConfig;
use crate::models::{
    Attraction, Coordinates, GeocodeMatch, NarrativeContext, NarrativeKind, PoiCategory,
    WeatherSnapshot,
};

pub mod gemini;
pub mod http;
pub mod nominatim;
pub mod open_meteo;
pub mod overpass;
pub mod wikipedia;

pub use gemini::GeminiClient;
pub use http::HttpTransport;
pub use nominatim::NominatimClient;
pub use open_meteo::OpenMeteoClient;
pub use overpass::OverpassClient;
pub use wikipedia::WikipediaPhotoClient;

/// Place name to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the gazetteer has no match
    async fn geocode(&self, place: &str) -> Result<Option<GeocodeMatch>>;
}

/// Coordinates to current conditions
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, coordinates: Coordinates) -> Result<Option<WeatherSnapshot>>;
}

/// Parameters of one POI search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacesQuery {
    pub center: Coordinates,
    pub radius_m: u32,
    pub limit: usize,
    pub category: PoiCategory,
}

/// Named places around a point
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn places(&self, query: &PlacesQuery) -> Result<Vec<Attraction>>;
}

/// Coordinates to a postal address
#[async_trait]
pub trait AddressProvider: Send + Sync {
    async fn address(&self, coordinates: Coordinates) -> Result<Option<String>>;
}

/// Search text to an image URL
#[async_trait]
pub trait PhotoProvider: Send + Sync {
    async fn photo(&self, query: &str) -> Result<Option<String>>;
}

/// Free-text generation from structured context
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        kind: NarrativeKind,
        context: &NarrativeContext,
    ) -> Result<Option<String>>;
}

/// The full set of data sources a query fans out to
#[derive(Clone)]
pub struct Collaborators {
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherProvider>,
    pub places: Arc<dyn PlacesProvider>,
    /// `None` skips address enrichment
    pub addresses: Option<Arc<dyn AddressProvider>>,
    pub photos: Arc<dyn PhotoProvider>,
    /// `None` disables narrative generation
    pub text: Option<Arc<dyn TextGenerator>>,
}

impl Collaborators {
    /// Wire the HTTP clients described by `config` over one shared transport
    pub fn from_config(config: &TourGuideConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.http)?;

        let nominatim = Arc::new(NominatimClient::new(
            transport.clone(),
            config.geocoding.base_url.clone(),
            config.geocoding.importance_margin,
            config.geocoding.candidate_limit,
        ));

        let addresses: Option<Arc<dyn AddressProvider>> = if config.places.resolve_addresses {
            Some(nominatim.clone())
        } else {
            None
        };

        let text: Option<Arc<dyn TextGenerator>> = if config.generative.enabled {
            Some(Arc::new(GeminiClient::from_config(
                transport.clone(),
                &config.generative,
            )?))
        } else {
            None
        };

        Ok(Self {
            geocoder: nominatim,
            weather: Arc::new(OpenMeteoClient::new(
                transport.clone(),
                config.weather.base_url.clone(),
            )),
            places: Arc::new(OverpassClient::new(
                transport.with_timeout(config.places.timeout()),
                config.places.overpass_url.clone(),
            )),
            addresses,
            photos: Arc::new(WikipediaPhotoClient::new(
                transport.with_timeout(config.photos.timeout()),
                config.photos.base_url.clone(),
                config.photos.thumbnail_size,
            )),
            text,
        })
    }
}
