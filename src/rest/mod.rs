//! REST API for the devpulse guided tour.
//!
//! The dashboard frontend polls or streams the tour view from here and feeds
//! overlay events and route changes back in. All state changes go through
//! the [`TourHandle`](crate::tour::TourHandle) held in [`ApiState`].

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod dto;
pub mod error;
pub mod extract;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::ApiState;

/// Build the API router with all routes
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/status", get(routes::health::status))
        // Tour endpoints
        .route("/api/v1/tour", get(routes::tour::view))
        .route("/api/v1/tour/catalog", get(routes::tour::catalog))
        .route("/api/v1/tour/start", post(routes::tour::start))
        .route("/api/v1/tour/restart", post(routes::tour::restart))
        .route("/api/v1/tour/events", post(routes::tour::events))
        .route("/api/v1/tour/location", post(routes::tour::location))
        .route("/api/v1/tour/stream", get(routes::tour::stream))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the REST API until `shutdown` resolves
pub async fn serve(
    state: ApiState,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("REST API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
