//! Logging and trace export setup

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

const SERVICE_NAME: &str = "tourguide";

/// Keeps the trace exporter alive; call [`Telemetry::shutdown`] before exit
/// to flush buffered spans.
pub struct Telemetry {
    provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    pub fn shutdown(self) {
        if let Some(provider) = self.provider
            && let Err(e) = provider.shutdown()
        {
            warn!("Failed to flush trace exporter: {}", e);
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `logging.level`. Output goes to stderr so stdout
/// stays clean for rendered answers.
pub fn init(config: &LoggingConfig) -> Result<Telemetry> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let json = config.format == "json";
    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let pretty_layer = (!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    let provider = config
        .otlp_endpoint
        .as_deref()
        .map(otlp_provider)
        .transpose()?;
    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(otel_layer)
        .try_init()
        .with_context(|| "Failed to install tracing subscriber")?;

    if let Some(endpoint) = &config.otlp_endpoint {
        info!("Exporting traces to {}", endpoint);
    }

    Ok(Telemetry { provider })
}

fn otlp_provider(endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint.to_string())
        .build()
        .with_context(|| format!("Failed to create OTLP exporter for {endpoint}"))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
        .build();
    opentelemetry::global::set_tracer_provider(provider.clone());

    Ok(provider)
}
