//! Configuration management for `TourGuide`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings. Credentials are
//! never embedded: a missing generative API key is a configuration error
//! unless generative text is disabled.

use crate::TourGuideError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable accepted as the generative API key when none is configured.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Root configuration structure for the `TourGuide` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TourGuideConfig {
    /// Shared HTTP transport settings
    pub http: HttpConfig,
    /// Geocoding (Nominatim) settings
    pub geocoding: GeocodingConfig,
    /// Current weather (Open-Meteo) settings
    pub weather: WeatherConfig,
    /// Points of interest (Overpass) settings
    pub places: PlacesConfig,
    /// Photo lookup (Wikipedia) settings
    pub photos: PhotoConfig,
    /// Generative text (Gemini) settings
    pub generative: GenerativeConfig,
    /// Fan-out limits and deadlines
    pub orchestrator: OrchestratorConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP front end settings
    pub server: ServerConfig,
}

/// HTTP transport settings shared by every collaborator client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_seconds: u32,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// User agent sent with every request (Nominatim rejects anonymous clients)
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Nominatim base URL, used for both search and reverse lookups
    pub base_url: String,
    /// A later candidate replaces the current best only when its importance
    /// exceeds the best by more than this fraction
    pub importance_margin: f64,
    /// Number of candidates requested per lookup
    pub candidate_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Open-Meteo base URL
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// Overpass interpreter endpoint
    pub overpass_url: String,
    /// Search radius around the resolved place in meters
    pub search_radius_m: u32,
    /// Look up a street address for every attraction
    pub resolve_addresses: bool,
    /// Overpass request timeout in seconds, matching the server-side query timeout
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Wikipedia API endpoint
    pub base_url: String,
    /// Requested thumbnail width in pixels
    pub thumbnail_size: u32,
    /// Per-lookup request timeout in seconds
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerativeConfig {
    /// Generate summary, tips and itinerary
    pub enabled: bool,
    /// API key; required when `enabled`
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Generative Language API base URL
    pub base_url: String,
    /// Individual deadline for each narrative call in seconds
    pub call_timeout_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Default number of attractions per query
    pub attraction_limit: usize,
    /// Maximum concurrent per-attraction lookups
    pub photo_concurrency: usize,
    /// Overall deadline for one query in seconds
    pub query_timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP traces endpoint; spans are exported only when set
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// Default value functions
fn default_http_timeout() -> u32 {
    10
}

fn default_http_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    format!("TourGuide/{}", env!("CARGO_PKG_VERSION"))
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_importance_margin() -> f64 {
    0.2
}

fn default_candidate_limit() -> u32 {
    5
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_search_radius() -> u32 {
    20_000
}

fn default_photo_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_thumbnail_size() -> u32 {
    600
}

fn default_places_timeout() -> u32 {
    30
}

fn default_photo_timeout() -> u32 {
    5
}

fn default_generative_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_generative_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_narrative_timeout() -> u32 {
    5
}

fn default_attraction_limit() -> usize {
    5
}

fn default_photo_concurrency() -> usize {
    5
}

fn default_query_timeout() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    5000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            max_retries: default_http_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_nominatim_url(),
            importance_margin: default_importance_margin(),
            candidate_limit: default_candidate_limit(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            overpass_url: default_overpass_url(),
            search_radius_m: default_search_radius(),
            resolve_addresses: true,
            timeout_seconds: default_places_timeout(),
        }
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            base_url: default_photo_url(),
            thumbnail_size: default_thumbnail_size(),
            timeout_seconds: default_photo_timeout(),
        }
    }
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: default_generative_model(),
            base_url: default_generative_url(),
            call_timeout_seconds: default_narrative_timeout(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            attraction_limit: default_attraction_limit(),
            photo_concurrency: default_photo_concurrency(),
            query_timeout_seconds: default_query_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl PlacesConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl PhotoConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl GenerativeConfig {
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds.into())
    }
}

impl OrchestratorConfig {
    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds.into())
    }
}

impl TourGuideConfig {
    /// Load configuration from the default location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // A path given by the user must exist; the fallbacks are optional
        let (config_file, required) = match config_path {
            Some(path) => (path, true),
            None => (
                Self::get_config_path()
                    .filter(|path| path.exists())
                    .unwrap_or_else(|| PathBuf::from("config.toml")),
                false,
            ),
        };

        if required || config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(required)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. TOURGUIDE_GENERATIVE__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("TOURGUIDE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TourGuideConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.generative.api_key.is_none() {
            config.generative.api_key = std::env::var(GEMINI_API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tourguide").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if !self.generative.enabled {
            return Ok(());
        }

        match self.generative.api_key.as_deref().map(str::trim) {
            None | Some("") => Err(TourGuideError::config(format!(
                "generative.api_key is required while generative text is enabled. \
                 Set TOURGUIDE_GENERATIVE__API_KEY or {GEMINI_API_KEY_ENV}, \
                 or set generative.enabled = false"
            ))
            .into()),
            Some(key) if key.len() < 8 => Err(TourGuideError::config(
                "Generative API key appears to be invalid (too short). Please check your API key.",
            )
            .into()),
            Some(_) => Ok(()),
        }
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds == 0 || self.http.timeout_seconds > 300 {
            return Err(
                TourGuideError::config("HTTP timeout must be between 1 and 300 seconds").into(),
            );
        }

        if self.http.max_retries > 10 {
            return Err(TourGuideError::config("HTTP max retries cannot exceed 10").into());
        }

        if self.geocoding.importance_margin < 0.0 || !self.geocoding.importance_margin.is_finite()
        {
            return Err(TourGuideError::config(
                "Geocoding importance margin must be a non-negative number",
            )
            .into());
        }

        if self.geocoding.candidate_limit == 0 || self.geocoding.candidate_limit > 50 {
            return Err(TourGuideError::config(
                "Geocoding candidate limit must be between 1 and 50",
            )
            .into());
        }

        if self.places.search_radius_m == 0 || self.places.search_radius_m > 100_000 {
            return Err(TourGuideError::config(
                "Places search radius must be between 1 and 100000 meters",
            )
            .into());
        }

        for (name, seconds) in [
            ("Places", self.places.timeout_seconds),
            ("Photo", self.photos.timeout_seconds),
        ] {
            if seconds == 0 || seconds > 300 {
                return Err(TourGuideError::config(format!(
                    "{name} timeout must be between 1 and 300 seconds"
                ))
                .into());
            }
        }

        if self.generative.call_timeout_seconds == 0 {
            return Err(
                TourGuideError::config("Generative call timeout must be at least 1 second").into(),
            );
        }

        if self.orchestrator.attraction_limit > 50 {
            return Err(TourGuideError::config("Attraction limit cannot exceed 50").into());
        }

        if self.orchestrator.photo_concurrency == 0 {
            return Err(TourGuideError::config("Photo concurrency must be at least 1").into());
        }

        if self.orchestrator.query_timeout_seconds == 0
            || self.orchestrator.query_timeout_seconds > 600
        {
            return Err(TourGuideError::config(
                "Query timeout must be between 1 and 600 seconds",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TourGuideError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TourGuideError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("geocoding.base_url", &self.geocoding.base_url),
            ("weather.base_url", &self.weather.base_url),
            ("places.overpass_url", &self.places.overpass_url),
            ("photos.base_url", &self.photos.base_url),
            ("generative.base_url", &self.generative.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TourGuideError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> TourGuideConfig {
        let mut config = TourGuideConfig::default();
        config.generative.api_key = Some("valid_api_key_123".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = TourGuideConfig::default();
        assert_eq!(config.geocoding.base_url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.http.timeout_seconds, 10);
        assert_eq!(config.http.max_retries, 2);
        assert_eq!(config.places.search_radius_m, 20_000);
        assert_eq!(config.generative.call_timeout_seconds, 5);
        assert_eq!(config.orchestrator.attraction_limit, 5);
        assert_eq!(config.orchestrator.photo_concurrency, 5);
        assert_eq!(config.logging.level, "info");
        assert!(config.generative.api_key.is_none());
        assert!((config.geocoding.importance_margin - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let config = TourGuideConfig::default();
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("generative.api_key is required")
        );
    }

    #[test]
    fn test_missing_api_key_allowed_when_generative_disabled() {
        let mut config = TourGuideConfig::default();
        config.generative.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_valid_api_key() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = valid_config();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = valid_config();
        config.http.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("HTTP timeout"));

        let mut config = valid_config();
        config.orchestrator.photo_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.geocoding.importance_margin = -0.5;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.places.timeout_seconds = 0;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Places timeout"));
    }

    #[test]
    fn test_config_validation_rejects_non_http_urls() {
        let mut config = valid_config();
        config.weather.base_url = "ftp://api.open-meteo.com".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("weather.base_url"));
    }

    #[test]
    fn test_durations() {
        let config = TourGuideConfig::default();
        assert_eq!(config.http.timeout(), Duration::from_secs(10));
        assert_eq!(config.http.retry_delay(), Duration::from_millis(1000));
        assert_eq!(config.generative.call_timeout(), Duration::from_secs(5));
        assert_eq!(config.orchestrator.query_timeout(), Duration::from_secs(30));
        assert_eq!(config.places.timeout(), Duration::from_secs(30));
        assert_eq!(config.photos.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_config_path_must_exist() {
        let path = std::env::temp_dir().join("tourguide-no-such-dir/config.toml");

        let result = TourGuideConfig::load_from_path(Some(path));

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to build configuration"), "{message}");
        assert!(message.contains("not found"), "{message}");
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("tourguide-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[generative]
enabled = false

[orchestrator]
attraction_limit = 8
query_timeout_seconds = 12

[geocoding]
importance_margin = 0.5
"#,
        )
        .unwrap();

        let config = TourGuideConfig::load_from_path(Some(path)).unwrap();
        assert!(!config.generative.enabled);
        assert_eq!(config.orchestrator.attraction_limit, 8);
        assert_eq!(config.orchestrator.query_timeout_seconds, 12);
        assert!((config.geocoding.importance_margin - 0.5).abs() < f64::EPSILON);
        // untouched sections keep their defaults
        assert_eq!(config.places.search_radius_m, 20_000);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = TourGuideConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("tourguide"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
