//! Shared fixtures: in-memory collaborators and a local JSON server
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tourguide::Collaborators;
use tourguide::clients::{
    AddressProvider, Geocoder, PhotoProvider, PlacesProvider, PlacesQuery, TextGenerator,
    WeatherProvider,
};
use tourguide::config::HttpConfig;
use tourguide::models::{
    Attraction, Coordinates, GeocodeMatch, NarrativeContext, NarrativeKind, WeatherSnapshot,
};

pub const BANGALORE: Coordinates = Coordinates {
    latitude: 12.9716,
    longitude: 77.5946,
};

/// Everything the fake collaborators answer with
#[derive(Clone)]
pub struct Scenario {
    pub geocode: Option<GeocodeMatch>,
    pub geocode_fails: bool,
    pub geocode_delay: Duration,
    pub weather: Option<WeatherSnapshot>,
    pub weather_fails: bool,
    pub places: Vec<Attraction>,
    pub places_fail: bool,
    pub places_delay: Duration,
    /// Photo queries containing any of these fail
    pub failing_photos: Vec<String>,
    pub photo_delay: Duration,
    pub address: Option<String>,
    pub addresses_enabled: bool,
    pub text_enabled: bool,
    pub text_delays: Vec<(NarrativeKind, Duration)>,
    pub failing_text: Vec<NarrativeKind>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            geocode: Some(GeocodeMatch {
                coordinates: BANGALORE,
                display_name: "Bengaluru, Bangalore North, Karnataka, India".to_string(),
                place_type: Some("city".to_string()),
                importance: 0.7,
            }),
            geocode_fails: false,
            geocode_delay: Duration::ZERO,
            weather: Some(sample_weather()),
            weather_fails: false,
            places: vec![
                attraction("Lalbagh", 12.9507, 77.5848),
                attraction("Cubbon Park", 12.9763, 77.5929),
                attraction("Bangalore Palace", 12.9987, 77.5921),
            ],
            places_fail: false,
            places_delay: Duration::ZERO,
            failing_photos: Vec::new(),
            photo_delay: Duration::ZERO,
            address: Some("Mavalli, Bengaluru, Karnataka, India".to_string()),
            addresses_enabled: true,
            text_enabled: true,
            text_delays: Vec::new(),
            failing_text: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn unknown_place() -> Self {
        Self {
            geocode: None,
            ..Self::default()
        }
    }

    /// Collaborators answering from this scenario, plus their shared call log
    pub fn build(self) -> (Collaborators, Arc<CallLog>) {
        let log = Arc::new(CallLog::default());
        let fake = Arc::new(FakeServices {
            scenario: self,
            log: log.clone(),
        });

        let addresses: Option<Arc<dyn AddressProvider>> = if fake.scenario.addresses_enabled {
            Some(fake.clone())
        } else {
            None
        };
        let text: Option<Arc<dyn TextGenerator>> = if fake.scenario.text_enabled {
            Some(fake.clone())
        } else {
            None
        };

        let collaborators = Collaborators {
            geocoder: fake.clone(),
            weather: fake.clone(),
            places: fake.clone(),
            addresses,
            photos: fake,
            text,
        };
        (collaborators, log)
    }
}

pub fn attraction(name: &str, latitude: f64, longitude: f64) -> Attraction {
    Attraction::new(name, Coordinates::new(latitude, longitude), "attraction")
}

pub fn sample_weather() -> WeatherSnapshot {
    WeatherSnapshot {
        temperature: 24.3,
        wind_speed: 11.2,
        wind_direction: 250.0,
        condition_code: 2,
        observation_time: None,
    }
}

/// Records every collaborator call as `"<service>:<argument>"`
#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
    photos_in_flight: AtomicUsize,
    photos_peak: AtomicUsize,
}

impl CallLog {
    fn record(&self, service: &str, argument: impl std::fmt::Display) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{service}:{argument}"));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, service: &str) -> usize {
        let prefix = format!("{service}:");
        self.calls()
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }

    /// Most photo lookups observed running at the same time
    pub fn photo_peak(&self) -> usize {
        self.photos_peak.load(Ordering::SeqCst)
    }
}

struct FakeServices {
    scenario: Scenario,
    log: Arc<CallLog>,
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl Geocoder for FakeServices {
    async fn geocode(&self, place: &str) -> Result<Option<GeocodeMatch>> {
        self.log.record("geocode", place);
        pause(self.scenario.geocode_delay).await;
        if self.scenario.geocode_fails {
            bail!("gazetteer unavailable");
        }
        Ok(self.scenario.geocode.clone())
    }
}

#[async_trait]
impl WeatherProvider for FakeServices {
    async fn current_weather(&self, coordinates: Coordinates) -> Result<Option<WeatherSnapshot>> {
        self.log.record("weather", coordinates.format_coordinates());
        if self.scenario.weather_fails {
            bail!("weather service returned HTTP 503");
        }
        Ok(self.scenario.weather.clone())
    }
}

#[async_trait]
impl PlacesProvider for FakeServices {
    async fn places(&self, query: &PlacesQuery) -> Result<Vec<Attraction>> {
        self.log
            .record("places", format!("{}/{}", query.category, query.limit));
        pause(self.scenario.places_delay).await;
        if self.scenario.places_fail {
            bail!("overpass timed out");
        }
        Ok(self.scenario.places.clone())
    }
}

#[async_trait]
impl AddressProvider for FakeServices {
    async fn address(&self, coordinates: Coordinates) -> Result<Option<String>> {
        self.log.record("address", coordinates.format_coordinates());
        Ok(self.scenario.address.clone())
    }
}

#[async_trait]
impl PhotoProvider for FakeServices {
    async fn photo(&self, query: &str) -> Result<Option<String>> {
        self.log.record("photo", query);

        let in_flight = self.log.photos_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.photos_peak.fetch_max(in_flight, Ordering::SeqCst);
        pause(self.scenario.photo_delay).await;
        self.log.photos_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self
            .scenario
            .failing_photos
            .iter()
            .any(|failing| query.contains(failing.as_str()))
        {
            bail!("no image service for {query}");
        }
        Ok(Some(format!(
            "https://images.test/{}.jpg",
            query.replace(' ', "_")
        )))
    }
}

#[async_trait]
impl TextGenerator for FakeServices {
    async fn generate(
        &self,
        kind: NarrativeKind,
        context: &NarrativeContext,
    ) -> Result<Option<String>> {
        self.log.record("generate", kind);

        let delay = self
            .scenario
            .text_delays
            .iter()
            .find(|(slow, _)| *slow == kind)
            .map_or(Duration::ZERO, |(_, delay)| *delay);
        pause(delay).await;

        if self.scenario.failing_text.contains(&kind) {
            bail!("quota exceeded");
        }
        if kind == NarrativeKind::Itinerary && context.attractions.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!(
            "{kind} for {} ({} attractions)",
            context.place,
            context.attractions.len()
        )))
    }
}

/// Canned HTTP response served by [`MockServer`]
#[derive(Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    /// Wall-clock wait between reading the request and replying
    pub delay: Duration,
}

impl MockResponse {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: "{}".to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request as seen by [`MockServer`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Serves the given responses in order, one per connection
pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    /// Panics when no local port can be bound; these tests need loopback networking
    pub async fn start(responses: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|err| panic!("HTTP client tests need a local listener: {err}"));
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        let handle = tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                if let Some(request) = read_request(&mut socket).await {
                    recorded.lock().unwrap().push(request);
                }
                if !response.delay.is_zero() {
                    tokio::time::sleep(response.delay).await;
                }

                let reply = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{}",
                    response.status,
                    reason(response.status),
                    response.body.len(),
                    response.body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Read headers and the full `Content-Length` body so the client never sees
/// a reset before its request is consumed
async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(index) = find(&buffer, b"\r\n\r\n") {
            break index;
        }
        let read = socket.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..read]);
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buffer.len() < body_start + content_length {
        let read = socket.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
    let body_end = buffer.len().min(body_start + content_length);
    let body = String::from_utf8_lossy(&buffer[body_start..body_end]).to_string();

    Some(RecordedRequest {
        request_line,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Fast transport settings for local tests
pub fn test_http_config(max_retries: u32) -> HttpConfig {
    HttpConfig {
        timeout_seconds: 5,
        max_retries,
        retry_delay_ms: 10,
        user_agent: "tourguide-tests/0.1".to_string(),
    }
}
