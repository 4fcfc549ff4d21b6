//! Gemini generative text for summaries, travel tips and itineraries

use std::fmt::Write as _;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::TextGenerator;
use super::http::{HttpTransport, endpoint};
use crate::TourGuideError;
use crate::config::GenerativeConfig;
use crate::models::{NarrativeContext, NarrativeKind};

/// Attractions mentioned in the summary prompt
const SUMMARY_ATTRACTIONS: usize = 5;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    transport: HttpTransport,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Trimmed text of the first candidate part, if non-empty
    fn text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|part| part.text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

impl GeminiClient {
    pub fn from_config(transport: HttpTransport, config: &GenerativeConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TourGuideError::config("generative.api_key is required"))?;

        Ok(Self {
            transport,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
        })
    }
}

/// Build the prompt for one narrative kind.
///
/// Returns `None` when the kind cannot be produced from `context`
/// (an itinerary needs at least one attraction).
#[must_use]
pub fn build_prompt(kind: NarrativeKind, context: &NarrativeContext) -> Option<String> {
    match kind {
        NarrativeKind::Summary => Some(summary_prompt(context)),
        NarrativeKind::Tips => Some(tips_prompt(context)),
        NarrativeKind::Itinerary => {
            (!context.attractions.is_empty()).then(|| itinerary_prompt(context))
        }
    }
}

fn summary_prompt(context: &NarrativeContext) -> String {
    let place = &context.place;
    let mut details = format!("Destination: {place}\n\n");
    if let Some(weather) = &context.weather {
        let _ = writeln!(details, "Current Weather: {}\n", weather.summary_line());
    }
    if !context.attractions.is_empty() {
        details.push_str("Top Attractions:\n");
        for (index, name) in context.attractions.iter().take(SUMMARY_ATTRACTIONS).enumerate() {
            let _ = writeln!(details, "{}. {}", index + 1, name);
        }
    }
    if !context.query.trim().is_empty() {
        let _ = writeln!(details, "\nThe traveller asked: \"{}\"", context.query.trim());
    }

    format!(
        "Based on the following information about {place}, provide a brief, engaging 2-3 sentence \
         summary for tourists. Focus on what makes this destination special and worth visiting.\n\n\
         {details}\n\
         Keep it concise, informative, and exciting."
    )
}

fn tips_prompt(context: &NarrativeContext) -> String {
    let place = &context.place;
    let mut details = format!("Destination: {place}\n");
    if let Some(weather) = &context.weather {
        let _ = writeln!(
            details,
            "Current Temperature: {}, Wind Speed: {:.1} km/h",
            weather.format_temperature(),
            weather.wind_speed
        );
    }

    format!(
        "Based on the current conditions in {place}, provide 3 brief, practical travel tips \
         (each in one short sentence).\nConsider the weather and general travel advice.\n\n\
         {details}\n\
         Format as a numbered list."
    )
}

fn itinerary_prompt(context: &NarrativeContext) -> String {
    let place = &context.place;
    let mut details = format!("Destination: {place}\n\n");
    if let Some(weather) = &context.weather {
        let _ = writeln!(details, "Current Temperature: {}\n", weather.format_temperature());
    }
    details.push_str("Attractions to visit:\n");
    for (index, name) in context.attractions.iter().enumerate() {
        let _ = writeln!(details, "{}. {}", index + 1, name);
    }

    format!(
        "Create a practical day-by-day itinerary for visiting these attractions in {place}.\n\
         Include suggested times (morning/afternoon/evening) for each attraction.\n\
         Keep it concise - 1-2 lines per attraction.\n\
         Format as:\n\n\
         Day 1:\n\
         - Morning: [Attraction] - [Brief tip]\n\
         - Afternoon: [Attraction] - [Brief tip]\n\n\
         {details}"
    )
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip(self, context), fields(kind = %kind, place = %context.place, model = %self.model))]
    async fn generate(
        &self,
        kind: NarrativeKind,
        context: &NarrativeContext,
    ) -> Result<Option<String>> {
        let Some(prompt) = build_prompt(kind, context) else {
            debug!("Nothing to generate for {}", kind);
            return Ok(None);
        };

        let url = endpoint(
            &self.base_url,
            &format!("models/{}:generateContent", self.model),
            &[],
        )?;
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response: GenerateContentResponse = self
            .transport
            .post_json("gemini", url, &[(API_KEY_HEADER, self.api_key.as_str())], &body)
            .await?;

        let text = response.text();
        debug!(
            "Generated {} ({} chars)",
            kind,
            text.as_ref().map_or(0, String::len)
        );
        Ok(text)
    }
}
