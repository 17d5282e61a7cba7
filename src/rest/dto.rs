//! Data Transfer Objects for the REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::TourConfig;
use crate::tour::{StepCatalog, StepDescriptor, TourView};

// =============================================================================
// Health DTOs
// =============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Service status with a tour summary
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub tour_running: bool,
    pub tour_completed: bool,
    pub group_count: usize,
    pub total_steps: usize,
    /// Whether the service starts the tour on boot
    pub auto_start: bool,
    pub mount_delay_ms: u64,
}

impl StatusResponse {
    pub fn new(view: &TourView, catalog: &StepCatalog, tour: &TourConfig) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tour_running: view.running,
            tour_completed: view.completed,
            group_count: catalog.len(),
            total_steps: catalog.total_steps(),
            auto_start: tour.auto_start,
            mount_delay_ms: tour.mount_delay_ms,
        }
    }
}

// =============================================================================
// Tour DTOs
// =============================================================================

/// One route's worth of tour steps, with its global numbering offset
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CatalogGroupSummary {
    pub index: usize,
    pub route: String,
    /// Steps in all earlier groups
    pub offset: usize,
    pub steps: Vec<StepDescriptor>,
}

/// The full tour catalog as served to the frontend
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CatalogResponse {
    pub total_steps: usize,
    pub groups: Vec<CatalogGroupSummary>,
}

impl From<&StepCatalog> for CatalogResponse {
    fn from(catalog: &StepCatalog) -> Self {
        Self {
            total_steps: catalog.total_steps(),
            groups: catalog
                .groups()
                .iter()
                .enumerate()
                .map(|(index, group)| CatalogGroupSummary {
                    index,
                    route: group.route.clone(),
                    offset: catalog.offset(index),
                    steps: group.steps.iter().map(StepDescriptor::from).collect(),
                })
                .collect(),
        }
    }
}

/// Location reported by the host router
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationRequest {
    /// Current path, e.g. `/repositories`
    pub path: String,
}
