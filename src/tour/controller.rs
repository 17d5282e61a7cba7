//! Single owner of the tour state.
//!
//! The controller is the only writer of [`TourState`]. Every public operation
//! applies at most one transition, performs the persistence write that
//! transition requires, and re-runs the navigation synchronizer whenever
//! `(running, group)` changed. The returned [`SyncAction`] tells the driver
//! whether a mount delay has to be scheduled.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::catalog::{CatalogError, StepCatalog};
use super::events::{route_event, TourEventPayload};
use super::navigation::{
    routes_match, HistoryRouter, NavigationSynchronizer, ReadyToken, Router, SyncAction,
};
use super::persistence::FlagStore;
use super::state::{TourPhase, TourState, Transition};
use super::view::TourView;

pub struct TourController<R: Router = HistoryRouter> {
    catalog: Arc<StepCatalog>,
    state: TourState,
    sync: NavigationSynchronizer,
    store: Box<dyn FlagStore>,
    router: R,
    run_id: Uuid,
}

impl<R: Router> TourController<R> {
    /// Create the session controller, reading the persisted completed flag.
    ///
    /// Fails when the catalog is structurally invalid, e.g. a group without steps.
    pub fn new(
        catalog: Arc<StepCatalog>,
        store: Box<dyn FlagStore>,
        router: R,
        mount_delay: Duration,
    ) -> Result<Self, CatalogError> {
        catalog.validate()?;
        let completed = store.load();
        tracing::debug!(completed, "loaded persisted tour flag");
        Ok(Self {
            catalog,
            state: TourState::from_persisted(completed),
            sync: NavigationSynchronizer::new(mount_delay),
            store,
            router,
            run_id: Uuid::new_v4(),
        })
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &TourState {
        &self.state
    }

    pub fn phase(&self) -> TourPhase {
        self.state.phase()
    }

    pub fn is_ready(&self) -> bool {
        self.sync.is_ready()
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    /// Identity of the current run; a new one is issued on every (re)start
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn start(&mut self) -> Option<SyncAction> {
        let transition = self.state.start();
        self.apply(transition)
    }

    pub fn restart(&mut self) -> Option<SyncAction> {
        let transition = self.state.restart();
        self.apply(transition)
    }

    /// Feed an overlay event through the event router
    pub fn dispatch(&mut self, payload: &TourEventPayload) -> Option<SyncAction> {
        let Some(command) = route_event(payload) else {
            tracing::debug!(?payload, "ignoring tour event");
            return None;
        };
        let transition = command.apply(&mut self.state, &self.catalog);
        self.apply(transition)
    }

    /// The host route changed; re-check alignment while the tour runs
    pub fn route_changed(&mut self) -> Option<SyncAction> {
        if !self.state.is_running() {
            return None;
        }
        Some(self.react())
    }

    /// A scheduled mount delay elapsed
    pub fn mount_elapsed(&mut self, token: ReadyToken) -> bool {
        if token.run_id != self.run_id {
            tracing::debug!(group = token.group, "discarding mount delay from a previous run");
            return false;
        }
        let ready = self.sync.mark_ready(token);
        if ready {
            tracing::debug!(group = token.group, "tour overlay ready");
        }
        ready
    }

    pub fn view(&self) -> TourView {
        TourView::project(
            &self.state,
            &self.catalog,
            self.sync.is_ready(),
            self.router.pending_navigation().map(str::to_string),
        )
    }

    fn apply(&mut self, transition: Option<Transition>) -> Option<SyncAction> {
        let transition = transition?;
        self.log_transition(transition);

        if matches!(
            transition,
            Transition::Started | Transition::Restarted { .. }
        ) {
            self.run_id = Uuid::new_v4();
        }

        if let Some(completed) = transition.persisted_flag() {
            if let Err(e) = self.store.save(completed) {
                tracing::warn!(error = %e, completed, "failed to persist tour flag");
            }
        }

        if transition.moves_group() {
            Some(self.react())
        } else {
            None
        }
    }

    fn react(&mut self) -> SyncAction {
        self.sync
            .react(&self.state, &self.catalog, self.run_id, &mut self.router)
    }

    fn log_transition(&self, transition: Transition) {
        match transition {
            Transition::Started | Transition::Restarted { .. } => {
                tracing::info!(?transition, groups = self.catalog.len(), "tour started");
            }
            Transition::Completed { reason } => {
                tracing::info!(
                    ?reason,
                    group = self.state.group_index(),
                    step = self.state.step_index(),
                    "tour completed"
                );
            }
            Transition::GroupChanged { from, to } => {
                tracing::debug!(from, to, "tour group changed");
            }
            Transition::StepChanged { group, from, to } => {
                tracing::debug!(group, from, to, "tour step changed");
            }
        }
    }
}

impl TourController<HistoryRouter> {
    /// Record a host location change and re-synchronise.
    ///
    /// Query, fragment or trailing-slash changes on the same route leave the
    /// overlay alone unless a navigation is still outstanding.
    pub fn visit(&mut self, path: &str) -> Option<SyncAction> {
        let same_route = self
            .router
            .current_path()
            .is_some_and(|current| routes_match(current, path));
        let settled = same_route && self.router.pending().is_none();

        self.router.set_location(path);
        if settled {
            return None;
        }
        self.route_changed()
    }
}
