//! OpenAPI specification builder using utoipa.

use utoipa::OpenApi;

use crate::rest::dto::{
    CatalogGroupSummary, CatalogResponse, HealthResponse, LocationRequest, StatusResponse,
};
use crate::rest::error::ErrorResponse;
use crate::tour::{
    Placement, StepDescriptor, TooltipChrome, TourAction, TourEventPayload, TourEventType,
    TourProgress, TourStatus, TourView,
};

/// OpenAPI documentation for the devpulse REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "devpulse API",
        description = "Guided product tour backend for the devpulse analytics dashboard.",
        license(name = "MIT")
    ),
    paths(
        // Health endpoints
        crate::rest::routes::health::health,
        crate::rest::routes::health::status,
        // Tour endpoints
        crate::rest::routes::tour::view,
        crate::rest::routes::tour::catalog,
        crate::rest::routes::tour::start,
        crate::rest::routes::tour::restart,
        crate::rest::routes::tour::events,
        crate::rest::routes::tour::location,
        crate::rest::routes::tour::stream,
    ),
    components(
        schemas(
            // Response types
            HealthResponse,
            StatusResponse,
            CatalogResponse,
            CatalogGroupSummary,
            TourView,
            StepDescriptor,
            TourProgress,
            TooltipChrome,
            Placement,
            ErrorResponse,
            // Request types
            TourEventPayload,
            TourAction,
            TourStatus,
            TourEventType,
            LocationRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check and status endpoints"),
        (name = "Tour", description = "Guided product tour state and overlay events"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI specification as a JSON string
    pub fn json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }

    /// Generate the OpenAPI specification as a YAML string
    pub fn yaml() -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&Self::openapi())
    }
}
