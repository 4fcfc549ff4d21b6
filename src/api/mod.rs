use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::models::QueryResult;
use crate::orchestrator::Orchestrator;
use crate::{Result as TourGuideResult, TourGuideError};

/// Largest attraction limit a client may ask for
pub const MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// `{"success": false, "error": ...}` with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<TourGuideError> for ApiError {
    fn from(error: TourGuideError) -> Self {
        match error {
            TourGuideError::Validation { message } => Self::bad_request(message),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: other.user_message(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/health", get(health))
        .with_state(orchestrator)
}

/// Clamp a requested limit into `1..=MAX_LIMIT`, falling back to `default`
#[must_use]
pub fn clamp_limit(requested: Option<i64>, default: usize) -> usize {
    match requested {
        Some(limit) => usize::try_from(limit.clamp(1, MAX_LIMIT as i64)).unwrap_or(1),
        None => default.clamp(1, MAX_LIMIT),
    }
}

/// The trimmed place and clamped limit of a search, or a validation error
pub fn validate_search(
    request: &SearchRequest,
    default_limit: usize,
) -> TourGuideResult<(&str, usize)> {
    let place = request
        .place
        .as_deref()
        .map(str::trim)
        .filter(|place| !place.is_empty())
        .ok_or_else(|| TourGuideError::validation("Please provide a place name"))?;

    Ok((place, clamp_limit(request.limit, default_limit)))
}

async fn search(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<QueryResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected search request: {}", rejection.body_text());
        ApiError::bad_request("Request body must be JSON like {\"place\": \"Paris\"}")
    })?;

    let (place, limit) = validate_search(&request, orchestrator.attraction_limit())?;
    info!("Search request: '{}' (limit {})", place, limit);

    Ok(Json(orchestrator.process(place, limit).await))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
