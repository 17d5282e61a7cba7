//! Tour Service - drives the controller on a single tokio task.
//!
//! All mutations go through one message loop, so the controller keeps a
//! single writer even when the REST layer serves requests concurrently:
//! - Requests arrive over an unbounded channel and are answered with the
//!   resulting [`TourView`]
//! - Mount delays run as spawned sleeps that post their token back to the
//!   loop; the previous delay is aborted whenever navigation re-synchronises
//! - Observers follow the tour through a `watch` channel
//!
//! The loop ends on [`TourHandle::shutdown`] or once every handle is dropped;
//! timers only hold a weak sender so they never keep it alive.

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::controller::TourController;
use super::events::TourEventPayload;
use super::navigation::{ReadyToken, SyncAction};
use super::state::TourPhase;
use super::view::TourView;

type Reply = oneshot::Sender<TourView>;

#[derive(Debug)]
enum TourMessage {
    Start(Reply),
    Restart(Reply),
    Dispatch(TourEventPayload, Reply),
    Visit(String, Reply),
    MountElapsed(ReadyToken),
    Shutdown,
}

/// Cloneable handle to a running [`TourService`]
#[derive(Debug, Clone)]
pub struct TourHandle {
    tx: mpsc::UnboundedSender<TourMessage>,
    view_rx: watch::Receiver<TourView>,
}

impl TourHandle {
    pub async fn start(&self) -> Result<TourView> {
        self.request(TourMessage::Start).await
    }

    pub async fn restart(&self) -> Result<TourView> {
        self.request(TourMessage::Restart).await
    }

    /// Forward an overlay event to the event router
    pub async fn dispatch(&self, payload: TourEventPayload) -> Result<TourView> {
        self.request(|reply| TourMessage::Dispatch(payload, reply))
            .await
    }

    /// Report the host's current location
    pub async fn visit(&self, path: impl Into<String>) -> Result<TourView> {
        let path = path.into();
        self.request(|reply| TourMessage::Visit(path, reply)).await
    }

    /// Latest published view
    pub fn view(&self) -> TourView {
        self.view_rx.borrow().clone()
    }

    /// Follow every published view
    pub fn subscribe(&self) -> watch::Receiver<TourView> {
        self.view_rx.clone()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(TourMessage::Shutdown);
    }

    async fn request(&self, build: impl FnOnce(Reply) -> TourMessage) -> Result<TourView> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .map_err(|_| anyhow!("tour service is not running"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("tour service stopped before replying"))
    }
}

/// Owns the controller and the pending mount delay
pub struct TourService {
    controller: TourController,
    rx: mpsc::UnboundedReceiver<TourMessage>,
    timer_tx: mpsc::WeakUnboundedSender<TourMessage>,
    view_tx: watch::Sender<TourView>,
    mount_timer: Option<JoinHandle<()>>,
}

impl TourService {
    /// Spawn the service loop; with `auto_start` an idle tour starts right away
    pub fn spawn(controller: TourController, auto_start: bool) -> (TourHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(controller.view());

        let mut service = Self {
            controller,
            rx,
            timer_tx: tx.downgrade(),
            view_tx,
            mount_timer: None,
        };

        if auto_start && service.controller.phase() == TourPhase::Idle {
            info!("tour not completed yet, starting automatically");
            let action = service.controller.start();
            service.schedule(action);
            service.publish();
        }

        let task = tokio::spawn(service.run());
        (TourHandle { tx, view_rx }, task)
    }

    async fn run(mut self) {
        debug!("tour service started");

        while let Some(message) = self.rx.recv().await {
            match message {
                TourMessage::Start(reply) => {
                    let action = self.controller.start();
                    self.finish(action, reply);
                }
                TourMessage::Restart(reply) => {
                    let action = self.controller.restart();
                    self.finish(action, reply);
                }
                TourMessage::Dispatch(payload, reply) => {
                    let action = self.controller.dispatch(&payload);
                    self.finish(action, reply);
                }
                TourMessage::Visit(path, reply) => {
                    let action = self.controller.visit(&path);
                    self.finish(action, reply);
                }
                TourMessage::MountElapsed(token) => {
                    if self.controller.mount_elapsed(token) {
                        self.publish();
                    }
                }
                TourMessage::Shutdown => break,
            }
        }

        self.cancel_mount_timer();
        debug!("tour service stopped");
    }

    fn finish(&mut self, action: Option<SyncAction>, reply: Reply) {
        self.schedule(action);
        let view = self.publish();
        let _ = reply.send(view);
    }

    /// Every reaction supersedes the previous mount delay
    fn schedule(&mut self, action: Option<SyncAction>) {
        let Some(action) = action else {
            return;
        };
        self.cancel_mount_timer();

        if let SyncAction::AwaitMount { token, delay } = action {
            let timer_tx = self.timer_tx.clone();
            self.mount_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(tx) = timer_tx.upgrade() {
                    let _ = tx.send(TourMessage::MountElapsed(token));
                }
            }));
        }
    }

    fn cancel_mount_timer(&mut self) {
        if let Some(timer) = self.mount_timer.take() {
            timer.abort();
        }
    }

    fn publish(&self) -> TourView {
        let view = self.controller.view();
        self.view_tx.send_replace(view.clone());
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::catalog::{Placement, StepCatalog, TourGroup, TourStep};
    use crate::tour::events::{TourAction, TourEventType, TourStatus};
    use crate::tour::navigation::HistoryRouter;
    use crate::tour::persistence::MemoryFlagStore;
    use std::sync::Arc;
    use std::time::Duration;

    const DELAY: Duration = Duration::from_millis(400);

    fn shared_route_catalog() -> StepCatalog {
        let step = TourStep {
            target: "#widget".to_string(),
            title: "Widget".to_string(),
            content: String::new(),
            placement: Placement::Bottom,
            suppress_entry_animation: false,
        };
        StepCatalog::new(
            (0..3)
                .map(|_| TourGroup {
                    route: "/".to_string(),
                    steps: vec![step.clone()],
                })
                .collect(),
        )
    }

    fn spawn(catalog: StepCatalog, store: MemoryFlagStore, auto_start: bool) -> TourHandle {
        spawn_with_router(catalog, store, HistoryRouter::new("/"), auto_start).0
    }

    fn spawn_with_router(
        catalog: StepCatalog,
        store: MemoryFlagStore,
        router: HistoryRouter,
        auto_start: bool,
    ) -> (TourHandle, JoinHandle<()>) {
        let controller =
            TourController::new(Arc::new(catalog), Box::new(store), router, DELAY).unwrap();
        TourService::spawn(controller, auto_start)
    }

    fn group_finished() -> TourEventPayload {
        TourEventPayload::new(
            TourAction::Next,
            0,
            TourStatus::GroupFinished,
            TourEventType::TourEnd,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_mount_delay() {
        let handle = spawn(StepCatalog::dashboard(), MemoryFlagStore::new(false), false);

        let view = handle.start().await.unwrap();
        assert!(view.running);
        assert!(!view.ready);

        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        assert!(!handle.view().ready);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let view = handle.view();
        assert!(view.ready);
        assert!(view.visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_delay_never_marks_ready() {
        let handle = spawn(shared_route_catalog(), MemoryFlagStore::new(false), false);
        handle.start().await.unwrap();
        tokio::time::sleep(DELAY * 2).await;
        assert!(handle.view().ready);

        // Group 0 -> 1 on the same route: readiness drops immediately
        let view = handle.dispatch(group_finished()).await.unwrap();
        assert_eq!(view.group_index, 1);
        assert!(!view.ready);

        // Group 1 -> 2 before the first delay elapsed
        tokio::time::sleep(DELAY / 2).await;
        let view = handle.dispatch(group_finished()).await.unwrap();
        assert_eq!(view.group_index, 2);
        assert!(!view.ready);

        // The group 1 delay would have fired here
        tokio::time::sleep(DELAY / 2 + Duration::from_millis(50)).await;
        assert!(!handle.view().ready);

        tokio::time::sleep(DELAY / 2).await;
        let view = handle.view();
        assert!(view.ready);
        assert_eq!(view.group_index, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_cancels_pending_delay() {
        let store = MemoryFlagStore::new(false);
        let handle = spawn(StepCatalog::dashboard(), store.clone(), false);
        handle.start().await.unwrap();

        let skip = TourEventPayload::new(
            TourAction::Skip,
            0,
            TourStatus::Skipped,
            TourEventType::StepAfter,
        );
        let view = handle.dispatch(skip).await.unwrap();
        assert!(!view.running);
        assert!(view.completed);

        tokio::time::sleep(DELAY * 2).await;
        assert!(!handle.view().ready);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_then_mount() {
        let handle = spawn(StepCatalog::dashboard(), MemoryFlagStore::new(false), false);
        handle.start().await.unwrap();

        let view = handle.dispatch(group_finished()).await.unwrap();
        assert_eq!(view.navigate_to.as_deref(), Some("/repositories"));

        // No readiness while the host is still on the old route
        tokio::time::sleep(DELAY * 2).await;
        assert!(!handle.view().ready);

        let view = handle.visit("/repositories").await.unwrap();
        assert!(view.navigate_to.is_none());
        assert!(!view.ready);

        tokio::time::sleep(DELAY + Duration::from_millis(1)).await;
        assert!(handle.view().visible);
    }

    #[tokio::test]
    async fn test_auto_start_respects_persisted_flag() {
        let handle = spawn(StepCatalog::dashboard(), MemoryFlagStore::new(false), true);
        assert!(handle.view().running);

        let handle = spawn(StepCatalog::dashboard(), MemoryFlagStore::new(true), true);
        let view = handle.view();
        assert!(!view.running);
        assert!(view.completed);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let handle = spawn(StepCatalog::dashboard(), MemoryFlagStore::new(false), false);
        let mut rx = handle.subscribe();
        assert!(!rx.borrow_and_update().running);

        handle.start().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_route_report_keeps_overlay_visible() {
        let handle = spawn(StepCatalog::dashboard(), MemoryFlagStore::new(false), false);
        handle.start().await.unwrap();
        tokio::time::sleep(DELAY + Duration::from_millis(100)).await;
        assert!(handle.view().visible);

        let view = handle.visit("/?range=30d").await.unwrap();
        assert!(view.ready);
        assert!(view.visible);
        assert_eq!(view.group_index, 0);

        tokio::time::sleep(DELAY * 2).await;
        assert!(handle.view().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_ready_before_host_reports_location() {
        let (handle, _task) = spawn_with_router(
            StepCatalog::dashboard(),
            MemoryFlagStore::new(false),
            HistoryRouter::default(),
            true,
        );

        tokio::time::sleep(DELAY * 2).await;
        let view = handle.view();
        assert!(view.running);
        assert!(!view.ready);
        assert_eq!(view.navigate_to.as_deref(), Some("/"));

        // Host is somewhere else entirely
        let view = handle.visit("/settings").await.unwrap();
        assert!(!view.ready);
        assert_eq!(view.navigate_to.as_deref(), Some("/"));
        tokio::time::sleep(DELAY * 2).await;
        assert!(!handle.view().ready);

        let view = handle.visit("/").await.unwrap();
        assert!(view.navigate_to.is_none());
        tokio::time::sleep(DELAY + Duration::from_millis(1)).await;
        assert!(handle.view().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_ends_when_all_handles_dropped() {
        let (handle, task) = spawn_with_router(
            StepCatalog::dashboard(),
            MemoryFlagStore::new(false),
            HistoryRouter::new("/"),
            false,
        );
        // Leave a mount delay outstanding
        handle.start().await.unwrap();
        drop(handle);

        tokio::time::timeout(DELAY / 2, task)
            .await
            .expect("service loop should stop without handles")
            .unwrap();
    }

    #[tokio::test]
    async fn test_requests_fail_after_shutdown() {
        let (handle, task) = spawn_with_router(
            StepCatalog::dashboard(),
            MemoryFlagStore::new(false),
            HistoryRouter::new("/"),
            false,
        );
        handle.shutdown();
        task.await.unwrap();

        assert!(handle.start().await.is_err());
    }
}
