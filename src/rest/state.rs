//! API state management for the REST server.

use std::sync::Arc;

use crate::config::Config;
use crate::tour::{StepCatalog, TourHandle};

/// Shared state for the REST API
#[derive(Clone)]
pub struct ApiState {
    /// Handle to the single-writer tour service
    pub tour: TourHandle,
    /// Catalog the service was started with
    pub catalog: Arc<StepCatalog>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl ApiState {
    pub fn new(tour: TourHandle, catalog: Arc<StepCatalog>, config: Config) -> Self {
        Self {
            tour,
            catalog,
            config: Arc::new(config),
        }
    }
}
