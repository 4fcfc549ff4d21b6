//! Overpass API points-of-interest search

use std::collections::HashMap;
use std::fmt::Write as _;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::http::{HttpTransport, endpoint};
use super::{PlacesProvider, PlacesQuery};
use crate::models::{Attraction, Coordinates, PoiCategory, dedup_by_name};

/// Tag keys consulted, in order, for an element's category tag
const CATEGORY_TAG_KEYS: &[&str] = &["tourism", "historic", "natural", "leisure", "amenity"];

/// Server-side query timeout in seconds
const QUERY_TIMEOUT_SECONDS: u32 = 30;

pub struct OverpassClient {
    transport: HttpTransport,
    overpass_url: String,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

/// A node carries `lat`/`lon`; a way queried with `out center` carries `center`
#[derive(Debug, Deserialize)]
struct Element {
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Center {
    lat: f64,
    lon: f64,
}

impl Element {
    fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => Some(Coordinates::new(lat, lon)),
            (_, _, Some(center)) => Some(Coordinates::new(center.lat, center.lon)),
            _ => None,
        }
    }

    fn name(&self) -> Option<&str> {
        ["name:en", "name"]
            .iter()
            .filter_map(|key| self.tags.get(*key))
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
    }

    fn category_tag(&self, category: PoiCategory) -> String {
        CATEGORY_TAG_KEYS
            .iter()
            .find_map(|key| self.tags.get(*key))
            .map_or_else(|| category.default_tag().to_string(), Clone::clone)
    }

    fn into_attraction(self, category: PoiCategory) -> Option<Attraction> {
        let name = self.name()?.to_string();
        let coordinates = self.coordinates()?;
        Some(Attraction::new(name, coordinates, self.category_tag(category)))
    }
}

/// `(key, value regex)` selectors searched for each category
fn selectors(category: PoiCategory) -> &'static [(&'static str, &'static str)] {
    match category {
        PoiCategory::Tourism => &[
            (
                "tourism",
                "attraction|viewpoint|museum|artwork|gallery|theme_park|zoo",
            ),
            (
                "historic",
                "monument|memorial|castle|ruins|archaeological_site",
            ),
            ("natural", "peak|waterfall|cave_entrance|hot_spring"),
            ("leisure", "park|garden|nature_reserve"),
        ],
        PoiCategory::Food => &[("amenity", "restaurant|cafe|fast_food|food_court|bar|pub")],
        PoiCategory::Accommodation => &[(
            "tourism",
            "hotel|hostel|guest_house|motel|apartment|camp_site",
        )],
    }
}

/// Build the Overpass QL union for one search
#[must_use]
pub fn build_query(query: &PlacesQuery) -> String {
    let around = format!(
        "(around:{},{},{})",
        query.radius_m, query.center.latitude, query.center.longitude
    );

    let mut ql = format!("[out:json][timeout:{QUERY_TIMEOUT_SECONDS}];\n(\n");
    for element_type in ["node", "way"] {
        for (key, pattern) in selectors(query.category) {
            let _ = writeln!(ql, "  {element_type}[\"{key}\"~\"{pattern}\"]{around};");
        }
    }
    ql.push_str(");\nout center;");
    ql
}

/// Turn raw elements into at most `limit` named attractions.
///
/// Only the first `limit * 3` elements are looked at.
fn collect_attractions(elements: Vec<Element>, query: &PlacesQuery) -> Vec<Attraction> {
    let candidates: Vec<Attraction> = elements
        .into_iter()
        .take(query.limit.saturating_mul(3))
        .filter_map(|element| element.into_attraction(query.category))
        .collect();

    let mut attractions = dedup_by_name(candidates);
    attractions.truncate(query.limit);
    attractions
}

impl OverpassClient {
    pub fn new(transport: HttpTransport, overpass_url: String) -> Self {
        Self {
            transport,
            overpass_url,
        }
    }
}

#[async_trait]
impl PlacesProvider for OverpassClient {
    #[instrument(skip(self, query), fields(category = %query.category, radius_m = query.radius_m, limit = query.limit))]
    async fn places(&self, query: &PlacesQuery) -> Result<Vec<Attraction>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        info!(
            "Searching {} places around {}",
            query.category,
            query.center.format_coordinates()
        );

        let url = endpoint(&self.overpass_url, "", &[])?;
        let ql = build_query(query);
        let response: OverpassResponse = self
            .transport
            .post_form_json("overpass", url, &[("data", ql.as_str())])
            .await?;

        debug!("Overpass returned {} elements", response.elements.len());
        let attractions = collect_attractions(response.elements, query);
        debug!("Keeping {} named places", attractions.len());

        Ok(attractions)
    }
}
