//! Keeps the host route aligned with the running tour group and gates overlay
//! readiness until the destination screen has had time to mount.
//!
//! Each reaction bumps a generation counter. A scheduled mount delay carries
//! the generation it was created for as a [`ReadyToken`] and only marks the
//! synchronizer ready if that generation is still current when it fires.

use std::time::Duration;

use uuid::Uuid;

use super::catalog::StepCatalog;
use super::state::TourState;

/// Default wait between reaching a route and trusting its content to exist
pub const DEFAULT_MOUNT_DELAY: Duration = Duration::from_millis(400);

/// Client-side routing primitives consumed by the synchronizer
pub trait Router: Send {
    /// The path the host currently shows, `None` until the host reports one
    fn current_path(&self) -> Option<&str>;

    /// Ask the host to navigate; the route changes asynchronously
    fn navigate(&mut self, path: &str);

    /// A requested navigation the host has not confirmed yet
    fn pending_navigation(&self) -> Option<&str> {
        None
    }
}

/// In-process router mirroring the location reported by the host.
///
/// Navigation requests are recorded rather than performed: the host reads
/// [`HistoryRouter::pending`], navigates, then reports the new location.
/// Until the first report the location is unknown and never matches a route.
#[derive(Debug, Clone, Default)]
pub struct HistoryRouter {
    location: Option<String>,
    pending: Option<String>,
    #[cfg(test)]
    requests: Vec<String>,
}

impl HistoryRouter {
    /// Router for a host already known to show `location`
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }

    /// Record a location change reported by the host
    pub fn set_location(&mut self, path: impl Into<String>) {
        let path = path.into();
        if self
            .pending
            .as_deref()
            .is_some_and(|target| routes_match(target, &path))
        {
            self.pending = None;
        }
        self.location = Some(path);
    }

    /// Navigation requested but not yet confirmed by the host
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Every navigation requested so far, oldest first
    #[cfg(test)]
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl Router for HistoryRouter {
    fn current_path(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn navigate(&mut self, path: &str) {
        self.pending = Some(path.to_string());
        #[cfg(test)]
        self.requests.push(path.to_string());
    }

    fn pending_navigation(&self) -> Option<&str> {
        self.pending()
    }
}

/// Compare two paths ignoring query strings, fragments and a trailing `/`
pub fn routes_match(a: &str, b: &str) -> bool {
    normalize_path(a) == normalize_path(b)
}

fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Identity of one scheduled mount delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyToken {
    pub generation: u64,
    pub run_id: Uuid,
    pub group: usize,
}

/// What the driver has to do after a reaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Tour not running; nothing to wait for
    Idle,
    /// Navigation was requested; react again once the route changes
    Navigate { path: String },
    /// On the right route; deliver the token back after `delay`
    AwaitMount { token: ReadyToken, delay: Duration },
}

#[derive(Debug)]
pub struct NavigationSynchronizer {
    mount_delay: Duration,
    generation: u64,
    ready: bool,
    pending: Option<ReadyToken>,
}

impl NavigationSynchronizer {
    pub fn new(mount_delay: Duration) -> Self {
        Self {
            mount_delay,
            generation: 0,
            ready: false,
            pending: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mount_delay(&self) -> Duration {
        self.mount_delay
    }

    /// The mount delay currently awaited, if any
    pub fn pending(&self) -> Option<ReadyToken> {
        self.pending
    }

    /// Re-synchronise after `(running, group)` or the host route changed.
    ///
    /// Readiness is always dropped and any pending delay invalidated before
    /// deciding between navigating and waiting for the mount delay.
    pub fn react(
        &mut self,
        state: &TourState,
        catalog: &StepCatalog,
        run_id: Uuid,
        router: &mut dyn Router,
    ) -> SyncAction {
        self.cancel();

        if !state.is_running() {
            return SyncAction::Idle;
        }

        let group = state.group_index();
        let route = match catalog.group(group) {
            Ok(g) => g.route.as_str(),
            Err(e) => {
                tracing::error!(error = %e, "tour group missing from catalog");
                return SyncAction::Idle;
            }
        };

        let on_route = router
            .current_path()
            .is_some_and(|current| routes_match(current, route));
        if !on_route {
            tracing::debug!(
                group,
                from = router.current_path().unwrap_or("<unknown>"),
                to = route,
                "tour navigating to group route"
            );
            router.navigate(route);
            return SyncAction::Navigate {
                path: route.to_string(),
            };
        }

        let token = ReadyToken {
            generation: self.generation,
            run_id,
            group,
        };
        self.pending = Some(token);
        tracing::debug!(group, generation = token.generation, delay = ?self.mount_delay, "waiting for tour target to mount");
        SyncAction::AwaitMount {
            token,
            delay: self.mount_delay,
        }
    }

    /// Deliver an elapsed mount delay; stale tokens are discarded
    pub fn mark_ready(&mut self, token: ReadyToken) -> bool {
        if self.pending != Some(token) {
            tracing::debug!(
                generation = token.generation,
                current = self.generation,
                group = token.group,
                "discarding stale mount delay"
            );
            return false;
        }
        self.pending = None;
        self.ready = true;
        true
    }

    /// Drop readiness and invalidate any pending mount delay
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.ready = false;
        self.pending = None;
    }
}

impl Default for NavigationSynchronizer {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_DELAY)
    }
}
