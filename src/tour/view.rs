//! Read-only projection of the tour consumed by the presentation layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use super::catalog::{Placement, StepCatalog, TourStep};
use super::state::TourState;

/// The step the overlay should currently display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema, ToSchema)]
#[ts(export)]
pub struct StepDescriptor {
    pub title: String,
    pub content: String,
    pub target: String,
    pub placement: Placement,
    pub suppress_entry_animation: bool,
}

impl From<&TourStep> for StepDescriptor {
    fn from(step: &TourStep) -> Self {
        Self {
            title: step.title.clone(),
            content: step.content.clone(),
            target: step.target.clone(),
            placement: step.placement,
            suppress_entry_animation: step.suppress_entry_animation,
        }
    }
}

/// 1-based global position, "step `current` of `total`"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema, ToSchema)]
#[ts(export)]
pub struct TourProgress {
    pub current: usize,
    pub total: usize,
}

/// Labels rendered around the tooltip body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema, ToSchema)]
#[ts(export)]
pub struct TooltipChrome {
    pub step_label: String,
    pub primary_label: String,
    pub show_back: bool,
}

/// Tooltip labels as a pure function of the current position.
///
/// Only the last step of the last group offers `Finish`; the back button is
/// hidden on the first step of the whole tour.
pub fn tooltip_chrome(
    group_offset: usize,
    is_last_group: bool,
    step_index: usize,
    group_len: usize,
    total_steps: usize,
) -> TooltipChrome {
    let current = group_offset + step_index + 1;
    let is_last_step = is_last_group && step_index + 1 >= group_len;
    TooltipChrome {
        step_label: format!("Step {current} of {total_steps}"),
        primary_label: if is_last_step { "Finish" } else { "Next" }.to_string(),
        show_back: current > 1,
    }
}

/// Snapshot of everything the overlay needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema, ToSchema)]
#[ts(export)]
pub struct TourView {
    pub running: bool,
    pub ready: bool,
    /// The overlay may render: running and ready
    pub visible: bool,
    pub completed: bool,
    pub group_index: usize,
    pub step_index: usize,
    /// Route of the current group while running
    pub route: Option<String>,
    pub step: Option<StepDescriptor>,
    pub progress: Option<TourProgress>,
    pub chrome: Option<TooltipChrome>,
    pub is_last_step: bool,
    /// Navigation the host still has to perform
    pub navigate_to: Option<String>,
}

impl TourView {
    /// Project the state; step details are only filled in while running
    pub fn project(
        state: &TourState,
        catalog: &StepCatalog,
        ready: bool,
        navigate_to: Option<String>,
    ) -> Self {
        let group = state.group_index();
        let index = state.step_index();
        let running = state.is_running();

        let mut view = Self {
            running,
            ready,
            visible: running && ready,
            completed: state.is_completed(),
            group_index: group,
            step_index: index,
            route: None,
            step: None,
            progress: None,
            chrome: None,
            is_last_step: false,
            navigate_to,
        };

        if !running {
            return view;
        }

        if let Ok(g) = catalog.group(group) {
            view.route = Some(g.route.clone());
        }
        if let Ok(step) = catalog.step(group, index) {
            let group_len = catalog.group_len(group);
            let total = catalog.total_steps();
            let offset = catalog.offset(group);
            let is_last_group = catalog.is_last_group(group);

            view.step = Some(StepDescriptor::from(step));
            view.progress = Some(TourProgress {
                current: offset + index + 1,
                total,
            });
            view.chrome = Some(tooltip_chrome(
                offset,
                is_last_group,
                index,
                group_len,
                total,
            ));
            view.is_last_step = is_last_group && index + 1 == group_len;
        }

        view
    }
}
