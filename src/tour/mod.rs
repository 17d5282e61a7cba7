//! Guided product tour.
//!
//! Walks a first-time user through the dashboard one route at a time:
//! - [`catalog`]: static groups of steps, each bound to one route
//! - [`state`]: the Idle / Active / Completed state machine
//! - [`events`]: overlay interaction events mapped to transitions
//! - [`navigation`]: route alignment and mount-delay readiness gating
//! - [`persistence`]: the "already completed" flag
//! - [`controller`]: single owner tying the pieces together
//! - [`service`]: tokio event loop and timers around the controller
//! - [`view`]: read-only projection for the presentation layer

pub mod catalog;
pub mod controller;
pub mod events;
pub mod navigation;
pub mod persistence;
pub mod service;
pub mod state;
pub mod view;

pub use catalog::{CatalogError, Placement, StepCatalog, TourGroup, TourStep};
pub use controller::TourController;
pub use events::{route_event, TourAction, TourCommand, TourEventPayload, TourEventType, TourStatus};
pub use navigation::{
    HistoryRouter, NavigationSynchronizer, ReadyToken, Router, SyncAction, DEFAULT_MOUNT_DELAY,
};
pub use persistence::{FileFlagStore, FlagStore, MemoryFlagStore};
pub use service::{TourHandle, TourService};
pub use state::{CompletionReason, TourPhase, TourState, Transition};
pub use view::{tooltip_chrome, StepDescriptor, TooltipChrome, TourProgress, TourView};
