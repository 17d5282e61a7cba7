//! Health check and status endpoints.

use axum::{extract::State, Json};

use crate::rest::dto::{HealthResponse, StatusResponse};
use crate::rest::state::ApiState;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get service status with a tour summary
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "Health",
    responses(
        (status = 200, description = "Service status with tour summary", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let view = state.tour.view();
    Json(StatusResponse::new(&view, &state.catalog, &state.config.tour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::state::testing::api_state;
    use crate::tour::MemoryFlagStore;

    #[tokio::test]
    async fn test_health() {
        let resp = health().await;
        assert_eq!(resp.status, "ok");
        assert!(!resp.version.is_empty());
    }

    #[tokio::test]
    async fn test_status_reports_completed_tour() {
        let state = api_state(MemoryFlagStore::new(true));

        let resp = status(State(state)).await;
        assert_eq!(resp.status, "ok");
        assert!(resp.tour_completed);
        assert!(!resp.tour_running);
        assert_eq!(resp.group_count, 6);
        assert_eq!(resp.total_steps, 14);
        assert!(resp.auto_start);
        assert_eq!(resp.mount_delay_ms, 400);
    }
}
