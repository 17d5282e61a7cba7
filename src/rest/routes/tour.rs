//! Guided tour endpoints.
//!
//! The frontend drives the tour through these handlers: it posts overlay
//! events and location changes, and renders whatever [`TourView`] comes back
//! or arrives on the event stream.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::WatchStream;

use crate::rest::dto::{CatalogResponse, LocationRequest};
use crate::rest::error::ApiError;
use crate::rest::extract::ApiJson;
use crate::rest::state::ApiState;
use crate::tour::{TourEventPayload, TourView};

/// Current tour view
#[utoipa::path(
    get,
    path = "/api/v1/tour",
    tag = "Tour",
    responses(
        (status = 200, description = "Current tour view", body = TourView)
    )
)]
pub async fn view(State(state): State<ApiState>) -> Json<TourView> {
    Json(state.tour.view())
}

/// Step catalog with global numbering offsets
#[utoipa::path(
    get,
    path = "/api/v1/tour/catalog",
    tag = "Tour",
    responses(
        (status = 200, description = "Tour step catalog", body = CatalogResponse)
    )
)]
pub async fn catalog(State(state): State<ApiState>) -> Json<CatalogResponse> {
    Json(CatalogResponse::from(state.catalog.as_ref()))
}

/// Start the tour unless it is running or already completed
#[utoipa::path(
    post,
    path = "/api/v1/tour/start",
    tag = "Tour",
    responses(
        (status = 200, description = "Tour view after the start request", body = TourView),
        (status = 503, description = "Tour service stopped", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn start(State(state): State<ApiState>) -> Result<Json<TourView>, ApiError> {
    Ok(Json(state.tour.start().await?))
}

/// Start over from the first step, clearing the completed flag
#[utoipa::path(
    post,
    path = "/api/v1/tour/restart",
    tag = "Tour",
    responses(
        (status = 200, description = "Tour view after restarting", body = TourView),
        (status = 503, description = "Tour service stopped", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn restart(State(state): State<ApiState>) -> Result<Json<TourView>, ApiError> {
    Ok(Json(state.tour.restart().await?))
}

/// Overlay event sink
#[utoipa::path(
    post,
    path = "/api/v1/tour/events",
    tag = "Tour",
    request_body = TourEventPayload,
    responses(
        (status = 200, description = "Tour view after routing the event", body = TourView),
        (status = 400, description = "Malformed or mistyped payload", body = crate::rest::error::ErrorResponse),
        (status = 503, description = "Tour service stopped", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn events(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<TourEventPayload>,
) -> Result<Json<TourView>, ApiError> {
    Ok(Json(state.tour.dispatch(payload).await?))
}

/// Report the host router's current path
#[utoipa::path(
    post,
    path = "/api/v1/tour/location",
    tag = "Tour",
    request_body = LocationRequest,
    responses(
        (status = 200, description = "Tour view after the location change", body = TourView),
        (status = 400, description = "Malformed body or a relative path", body = crate::rest::error::ErrorResponse),
        (status = 503, description = "Tour service stopped", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn location(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<LocationRequest>,
) -> Result<Json<TourView>, ApiError> {
    if !request.path.starts_with('/') {
        return Err(ApiError::ValidationError(format!(
            "path must start with '/': {}",
            request.path
        )));
    }
    Ok(Json(state.tour.visit(request.path).await?))
}

/// Server-sent events carrying every published tour view
#[utoipa::path(
    get,
    path = "/api/v1/tour/stream",
    tag = "Tour",
    responses(
        (status = 200, description = "Stream of `tour` events with a TourView JSON body", body = String, content_type = "text/event-stream")
    )
)]
pub async fn stream(
    State(state): State<ApiState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let views = WatchStream::new(state.tour.subscribe()).filter_map(|view| async move {
        match Event::default().event("tour").json_data(&view) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode tour view");
                None
            }
        }
    });

    Sse::new(views).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
