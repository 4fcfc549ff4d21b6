use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::orchestrator::Orchestrator;

/// Extra time a request gets beyond the query deadline
const REQUEST_GRACE: Duration = Duration::from_secs(5);

/// The full HTTP application with `/api` routes and shared layers
pub fn app(orchestrator: Arc<Orchestrator>) -> Router {
    let request_timeout = orchestrator.settings().query_timeout + REQUEST_GRACE;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(orchestrator))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(orchestrator: Arc<Orchestrator>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);

    axum::serve(listener, app(orchestrator))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down web server");
        })
        .await
        .with_context(|| "Web server failed")
}
