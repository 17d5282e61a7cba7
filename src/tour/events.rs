//! Translation of overlay interaction events into tour transitions.
//!
//! The overlay renderer reports `{ action, index, status, type }` after every
//! interaction. Only a handful of combinations mean anything to the tour; the
//! rest are ignored without error so renderer-specific events pass through.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use super::catalog::StepCatalog;
use super::state::{TourState, Transition};

/// What the user did in the overlay
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, JsonSchema, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TourAction {
    Next,
    Prev,
    Close,
    Skip,
    Start,
    Update,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Lifecycle status reported by the overlay
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, JsonSchema, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TourStatus {
    Idle,
    Ready,
    Waiting,
    Running,
    Paused,
    Skipped,
    /// The overlay walked past the last step of the group it was showing
    #[serde(alias = "finished")]
    GroupFinished,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Overlay event kind
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, JsonSchema, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TourEventType {
    #[serde(alias = "tour:start")]
    TourStart,
    #[serde(alias = "step:before")]
    StepBefore,
    #[serde(alias = "step:after")]
    StepAfter,
    #[serde(alias = "tour:end")]
    TourEnd,
    #[serde(alias = "error:target_not_found")]
    TargetNotFound,
    Beacon,
    Tooltip,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Event payload emitted by the overlay renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema, ToSchema)]
#[ts(export)]
pub struct TourEventPayload {
    #[serde(default)]
    pub action: TourAction,
    /// Step index within the current group the event refers to
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub status: TourStatus,
    #[serde(rename = "type", default)]
    pub event_type: TourEventType,
}

impl TourEventPayload {
    pub fn new(
        action: TourAction,
        index: usize,
        status: TourStatus,
        event_type: TourEventType,
    ) -> Self {
        Self {
            action,
            index,
            status,
            event_type,
        }
    }
}

/// A tour transition requested by an overlay event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourCommand {
    Skip,
    Close,
    GroupFinished,
    StepNext(usize),
    StepPrev(usize),
}

impl TourCommand {
    pub fn apply(self, state: &mut TourState, catalog: &StepCatalog) -> Option<Transition> {
        match self {
            TourCommand::Skip => state.skip(),
            TourCommand::Close => state.close(),
            TourCommand::GroupFinished => state.group_finished(catalog),
            TourCommand::StepNext(index) => state.step_next(index, catalog),
            TourCommand::StepPrev(index) => state.step_prev(index, catalog),
        }
    }
}

/// Map an overlay event to a tour command; the first matching rule wins
pub fn route_event(payload: &TourEventPayload) -> Option<TourCommand> {
    if payload.status == TourStatus::Skipped {
        return Some(TourCommand::Skip);
    }
    if payload.action == TourAction::Close {
        return Some(TourCommand::Close);
    }
    if payload.status == TourStatus::GroupFinished {
        return Some(TourCommand::GroupFinished);
    }
    if payload.event_type == TourEventType::StepAfter {
        match payload.action {
            TourAction::Next => return Some(TourCommand::StepNext(payload.index)),
            TourAction::Prev => return Some(TourCommand::StepPrev(payload.index)),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(
        action: TourAction,
        index: usize,
        status: TourStatus,
        event_type: TourEventType,
    ) -> TourEventPayload {
        TourEventPayload::new(action, index, status, event_type)
    }

    #[test]
    fn test_skipped_status_wins() {
        let event = payload(
            TourAction::Next,
            2,
            TourStatus::Skipped,
            TourEventType::StepAfter,
        );
        assert_eq!(route_event(&event), Some(TourCommand::Skip));
    }

    #[test]
    fn test_close_action() {
        let event = payload(
            TourAction::Close,
            1,
            TourStatus::Running,
            TourEventType::StepAfter,
        );
        assert_eq!(route_event(&event), Some(TourCommand::Close));
    }

    #[test]
    fn test_group_finished_status() {
        let event = payload(
            TourAction::Next,
            4,
            TourStatus::GroupFinished,
            TourEventType::TourEnd,
        );
        assert_eq!(route_event(&event), Some(TourCommand::GroupFinished));
    }

    #[test]
    fn test_step_after_next_and_prev() {
        let next = payload(
            TourAction::Next,
            1,
            TourStatus::Running,
            TourEventType::StepAfter,
        );
        assert_eq!(route_event(&next), Some(TourCommand::StepNext(1)));

        let prev = payload(
            TourAction::Prev,
            1,
            TourStatus::Running,
            TourEventType::StepAfter,
        );
        assert_eq!(route_event(&prev), Some(TourCommand::StepPrev(1)));
    }

    #[test]
    fn test_unrecognized_combinations_are_ignored() {
        let cases = [
            payload(
                TourAction::Next,
                0,
                TourStatus::Running,
                TourEventType::StepBefore,
            ),
            payload(
                TourAction::Update,
                0,
                TourStatus::Running,
                TourEventType::StepAfter,
            ),
            payload(
                TourAction::Start,
                0,
                TourStatus::Ready,
                TourEventType::TourStart,
            ),
            payload(
                TourAction::Unknown,
                0,
                TourStatus::Unknown,
                TourEventType::Unknown,
            ),
        ];
        for event in &cases {
            assert_eq!(route_event(event), None, "{event:?}");
        }
    }

    #[test]
    fn test_deserialize_renderer_payload() {
        let json = r#"{"action":"next","index":3,"status":"running","type":"step:after","lifecycle":"complete"}"#;
        let event: TourEventPayload = serde_json::from_str(json).unwrap();
        assert_eq!(event.action, TourAction::Next);
        assert_eq!(event.index, 3);
        assert_eq!(event.event_type, TourEventType::StepAfter);
        assert_eq!(route_event(&event), Some(TourCommand::StepNext(3)));
    }

    #[test]
    fn test_deserialize_unknown_strings() {
        let json = r#"{"action":"wiggle","index":0,"status":"dancing","type":"beacon:hover"}"#;
        let event: TourEventPayload = serde_json::from_str(json).unwrap();
        assert_eq!(event.action, TourAction::Unknown);
        assert_eq!(event.status, TourStatus::Unknown);
        assert_eq!(event.event_type, TourEventType::Unknown);
        assert_eq!(route_event(&event), None);
    }

    #[test]
    fn test_finished_alias() {
        let json = r#"{"action":"next","index":1,"status":"finished","type":"tour:end"}"#;
        let event: TourEventPayload = serde_json::from_str(json).unwrap();
        assert_eq!(event.status, TourStatus::GroupFinished);
        assert_eq!(route_event(&event), Some(TourCommand::GroupFinished));
    }

    #[test]
    fn test_command_applies_transition() {
        let catalog = StepCatalog::dashboard();
        let mut state = TourState::from_persisted(false);
        state.start();

        TourCommand::StepNext(0).apply(&mut state, &catalog);
        assert_eq!(state.step_index(), 1);

        TourCommand::StepPrev(1).apply(&mut state, &catalog);
        assert_eq!(state.step_index(), 0);

        TourCommand::GroupFinished.apply(&mut state, &catalog);
        assert_eq!(state.group_index(), 1);

        TourCommand::Close.apply(&mut state, &catalog);
        assert!(state.is_completed());
        assert!(!state.is_running());
    }
}
