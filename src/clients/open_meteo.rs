//! Open-Meteo current conditions

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::{debug, instrument, warn};

use super::WeatherProvider;
use super::http::{HttpTransport, endpoint};
use crate::models::{Coordinates, WeatherSnapshot};

pub struct OpenMeteoClient {
    transport: HttpTransport,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(transport: HttpTransport, base_url: String) -> Self {
        Self {
            transport,
            base_url,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn current_weather(&self, coordinates: Coordinates) -> Result<Option<WeatherSnapshot>> {
        let url = endpoint(
            &self.base_url,
            "forecast",
            &[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("current_weather", "true".to_string()),
            ],
        )?;

        let response: openmeteo::ForecastResponse =
            self.transport.get_json("open-meteo", url).await?;

        let snapshot = response.current_weather.map(WeatherSnapshot::from);
        match &snapshot {
            Some(weather) => debug!("Current weather: {}", weather.summary_line()),
            None => warn!("Open-Meteo response carried no current weather block"),
        }
        Ok(snapshot)
    }
}

/// Parse Open-Meteo's local ISO time, with or without seconds
#[must_use]
pub fn parse_observation_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// `OpenMeteo` API response structures
mod openmeteo {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub current_weather: Option<CurrentWeather>,
    }

    /// `current_weather=true` block; wind speed is km/h by default
    #[derive(Debug, Deserialize)]
    pub struct CurrentWeather {
        pub temperature: f64,
        #[serde(rename = "windspeed")]
        pub wind_speed: f64,
        #[serde(rename = "winddirection")]
        pub wind_direction: f64,
        #[serde(rename = "weathercode", default)]
        pub weather_code: u8,
        pub time: Option<String>,
    }
}

impl From<openmeteo::CurrentWeather> for WeatherSnapshot {
    fn from(current: openmeteo::CurrentWeather) -> Self {
        Self {
            temperature: current.temperature,
            wind_speed: current.wind_speed,
            wind_direction: current.wind_direction,
            condition_code: current.weather_code,
            observation_time: current.time.as_deref().and_then(parse_observation_time),
        }
    }
}
