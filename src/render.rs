//! Plain-text rendering of query results

use crate::models::{Attraction, Intent, NarrativeContent, QueryResult, WeatherSnapshot};

const NO_PLACES: &str = "No places found.";
const LIST_DIVIDER: &str = "- - - - -";

/// Render a result using the template chosen by its intent.
#[must_use]
pub fn render(result: &QueryResult) -> String {
    let place = match (&result.place, result.success) {
        (Some(place), true) => place.display_name.as_str(),
        _ => {
            return result
                .error_message
                .clone()
                .unwrap_or_else(|| "Unknown error occurred".to_string());
        }
    };

    let attractions = attraction_lines(&result.attractions);
    match result.intent {
        Intent::Weather => weather_sentence(place, result.weather.as_ref()),
        Intent::PlanTrip => {
            format!("In {place} these are the places you can go, {LIST_DIVIDER}\n{attractions}")
        }
        Intent::Food => {
            format!("In {place} these are the places you can eat, {LIST_DIVIDER}\n{attractions}")
        }
        Intent::Accommodation => {
            format!("In {place} these are the places you can stay, {LIST_DIVIDER}\n{attractions}")
        }
        Intent::Combined => format!(
            "{} And these are the places you can go: {LIST_DIVIDER}\n{attractions}",
            weather_sentence(place, result.weather.as_ref())
        ),
    }
}

/// Render whichever narrative sections are present, or `None` if none are
#[must_use]
pub fn render_narrative(narrative: &NarrativeContent) -> Option<String> {
    let sections: Vec<String> = [
        ("Summary", &narrative.summary),
        ("Travel tips", &narrative.travel_tips),
        ("Itinerary", &narrative.itinerary),
    ]
    .into_iter()
    .filter_map(|(title, text)| text.as_ref().map(|text| format!("{title}:\n{text}")))
    .collect();

    (!sections.is_empty()).then(|| sections.join("\n\n"))
}

fn weather_sentence(place: &str, weather: Option<&WeatherSnapshot>) -> String {
    match weather {
        Some(weather) => format!(
            "In {place} it's currently {}°C with wind speed of {} km/h.",
            decimal(weather.temperature),
            decimal(weather.wind_speed)
        ),
        None => format!("In {place}, weather information is currently unavailable."),
    }
}

fn attraction_lines(attractions: &[Attraction]) -> String {
    if attractions.is_empty() {
        return NO_PLACES.to_string();
    }
    attractions
        .iter()
        .map(|attraction| attraction.name.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shortest decimal form, keeping one fractional digit for whole numbers
fn decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
