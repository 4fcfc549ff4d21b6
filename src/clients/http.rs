//! Retrying HTTP transport shared by every collaborator client
//!
//! Wraps a `reqwest` client in `reqwest-middleware` with a transient-failure
//! retry policy. Connect errors, timeouts, 5xx, 408 and 429 responses are
//! retried `max_retries` times with a fixed delay; anything else surfaces
//! immediately as a [`TourGuideError::Api`].
//!
//! Every request uses the shared `http.timeout_seconds` unless the transport
//! was derived with [`HttpTransport::with_timeout`].

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::RetryTransientMiddleware;
use reqwest_retry::policies::ExponentialBackoff;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::TourGuideError;
use crate::config::HttpConfig;

/// Calls slower than this are logged as warnings
const SLOW_CALL_THRESHOLD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ClientWithMiddleware,
    request_timeout: Option<Duration>,
}

impl HttpTransport {
    /// Create a transport from the shared HTTP settings
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        // Equal bounds turn the exponential policy into a fixed delay
        let policy = ExponentialBackoff::builder()
            .retry_bounds(config.retry_delay(), config.retry_delay())
            .build_with_max_retries(config.max_retries);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(policy))
            .build();

        Ok(Self {
            client,
            request_timeout: None,
        })
    }

    /// A transport sharing this client whose requests time out after `timeout`
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            client: self.client.clone(),
            request_timeout: Some(timeout),
        }
    }

    /// GET `url` and decode the JSON body
    #[instrument(skip(self, url), fields(service = service))]
    pub async fn get_json<T: DeserializeOwned>(&self, service: &'static str, url: Url) -> Result<T> {
        debug!("GET {}", url.path());
        self.execute(service, self.client.get(url)).await
    }

    /// POST url-encoded `fields` and decode the JSON body
    #[instrument(skip(self, url, fields), fields(service = service))]
    pub async fn post_form_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: Url,
        fields: &[(&str, &str)],
    ) -> Result<T> {
        self.execute(service, self.client.post(url).form(fields)).await
    }

    /// POST `body` as JSON with extra `headers` and decode the JSON response
    #[instrument(skip(self, url, headers, body), fields(service = service))]
    pub async fn post_json<B, T>(
        &self,
        service: &'static str,
        url: Url,
        headers: &[(&'static str, &str)],
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.execute(service, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let request = match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };
        let start_time = Instant::now();

        let response = request.send().await.map_err(|e| {
            warn!("{} request failed after retries: {}", service, e);
            TourGuideError::api(format!("{service} request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned HTTP {}", service, status.as_u16());
            return Err(TourGuideError::api(format!(
                "{service} returned HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            ))
            .into());
        }

        let parsed: T = response.json().await.map_err(|e| {
            warn!("Failed to parse {} response: {}", service, e);
            TourGuideError::api(format!("Invalid {service} response: {e}"))
        })?;

        let elapsed = start_time.elapsed();
        debug!("{} responded in {:.3}s", service, elapsed.as_secs_f64());
        if elapsed > SLOW_CALL_THRESHOLD {
            warn!(
                "Slow {} response detected: {:.3}s",
                service,
                elapsed.as_secs_f64()
            );
        }

        Ok(parsed)
    }
}

/// Join `base` and `path` and append query `params`
pub fn endpoint(base: &str, path: &str, params: &[(&str, String)]) -> Result<Url> {
    let base = base.trim_end_matches('/');
    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{}", path.trim_start_matches('/'))
    };

    let parsed = if params.is_empty() {
        Url::parse(&joined)
    } else {
        Url::parse_with_params(&joined, params)
    };

    parsed.map_err(|e| TourGuideError::config(format!("Invalid endpoint URL '{joined}': {e}")).into())
}
