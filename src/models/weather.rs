//! Current weather snapshot and display methods

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Current conditions at a resolved place. Absence means "unavailable".
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: f64,
    /// WMO weather interpretation code
    pub condition_code: u8,
    /// Local observation time reported by the provider
    pub observation_time: Option<NaiveDateTime>,
}

impl WeatherSnapshot {
    /// Convert wind direction from degrees to cardinal direction
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: f64) -> &'static str {
        if !(0.0..=360.0).contains(&degrees) {
            return "Unknown";
        }
        match degrees.round() as u16 {
            0..=11 | 349..=360 => "N",
            12..=33 => "NNE",
            34..=56 => "NE",
            57..=78 => "ENE",
            79..=101 => "E",
            102..=123 => "ESE",
            124..=146 => "SE",
            147..=168 => "SSE",
            169..=191 => "S",
            192..=213 => "SSW",
            214..=236 => "SW",
            237..=258 => "WSW",
            259..=281 => "W",
            282..=303 => "WNW",
            304..=326 => "NW",
            327..=348 => "NNW",
            _ => "Unknown",
        }
    }

    /// Convert a WMO weather code to a human-readable description
    #[must_use]
    pub fn condition_description(code: u8) -> &'static str {
        match code {
            0 => "Clear sky",
            1 => "Mainly clear",
            2 => "Partly cloudy",
            3 => "Overcast",
            45 => "Fog",
            48 => "Depositing rime fog",
            51 => "Light drizzle",
            53 => "Moderate drizzle",
            55 => "Dense drizzle",
            56 => "Light freezing drizzle",
            57 => "Dense freezing drizzle",
            61 => "Slight rain",
            63 => "Moderate rain",
            65 => "Heavy rain",
            66 => "Light freezing rain",
            67 => "Heavy freezing rain",
            71 => "Slight snow fall",
            73 => "Moderate snow fall",
            75 => "Heavy snow fall",
            77 => "Snow grains",
            80 => "Slight rain showers",
            81 => "Moderate rain showers",
            82 => "Violent rain showers",
            85 => "Slight snow showers",
            86 => "Heavy snow showers",
            95 => "Thunderstorm",
            96 => "Thunderstorm with slight hail",
            99 => "Thunderstorm with heavy hail",
            _ => "Unknown",
        }
    }

    /// Description of the current conditions
    #[must_use]
    pub fn description(&self) -> &'static str {
        Self::condition_description(self.condition_code)
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        let direction = Self::wind_direction_to_cardinal(self.wind_direction);
        format!("{:.1} km/h {}", self.wind_speed, direction)
    }

    /// One-line summary used as generative context
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "{}, {}, wind {}",
            self.description(),
            self.format_temperature(),
            self.format_wind()
        )
    }
}
