//! Tour state machine.
//!
//! States are `Idle`, `Active(group, step)` and `Completed`. Every mutating
//! method returns the [`Transition`] it performed, or `None` when the call did
//! not change anything. Callers use the transition to decide on the single
//! persistence write and on whether navigation has to be re-synchronised.

use super::catalog::StepCatalog;

/// Why the tour left the active state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The last step of the last group was acknowledged
    Finished,
    Skipped,
    Closed,
}

/// Derived view of the state machine position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourPhase {
    Idle,
    Active { group: usize, step: usize },
    Completed,
}

/// A state change performed by [`TourState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Restarted { was_completed: bool },
    StepChanged { group: usize, from: usize, to: usize },
    GroupChanged { from: usize, to: usize },
    Completed { reason: CompletionReason },
}

impl Transition {
    /// The persisted flag value this transition has to write, if any.
    ///
    /// Entering `Completed` writes `true`; leaving it through a restart writes
    /// `false`. Nothing else touches storage.
    pub fn persisted_flag(&self) -> Option<bool> {
        match self {
            Transition::Completed { .. } => Some(true),
            Transition::Restarted {
                was_completed: true,
            } => Some(false),
            _ => None,
        }
    }

    /// Whether `(running, group)` changed, which re-triggers navigation sync
    pub fn moves_group(&self) -> bool {
        !matches!(self, Transition::StepChanged { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TourState {
    is_running: bool,
    group_index: usize,
    step_index: usize,
    completed: bool,
}

impl TourState {
    /// Create the session state from the persisted completed flag
    pub fn from_persisted(completed: bool) -> Self {
        Self {
            completed,
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn group_index(&self) -> usize {
        self.group_index
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn phase(&self) -> TourPhase {
        if self.is_running {
            TourPhase::Active {
                group: self.group_index,
                step: self.step_index,
            }
        } else if self.completed {
            TourPhase::Completed
        } else {
            TourPhase::Idle
        }
    }

    /// Idle -> Active(0, 0). A running or completed tour is left untouched;
    /// use [`TourState::restart`] to replay a completed one.
    pub fn start(&mut self) -> Option<Transition> {
        if self.phase() != TourPhase::Idle {
            tracing::debug!(phase = ?self.phase(), "tour start ignored");
            return None;
        }
        self.activate();
        Some(Transition::Started)
    }

    /// Re-enter Active(0, 0) from any state, clearing the completed flag
    pub fn restart(&mut self) -> Option<Transition> {
        let was_completed = self.completed;
        self.completed = false;
        self.activate();
        Some(Transition::Restarted { was_completed })
    }

    /// Advance within the current group.
    ///
    /// Stepping past the last step of a group is the driver's mistake: it is
    /// expected to report `group_finished` instead. Such requests are ignored.
    pub fn step_next(&mut self, current: usize, catalog: &StepCatalog) -> Option<Transition> {
        if !self.is_running {
            return None;
        }
        let len = catalog.group_len(self.group_index);
        let next = current.saturating_add(1);
        if next >= len {
            tracing::warn!(
                group = self.group_index,
                index = current,
                len,
                "next requested past the end of a tour group; waiting for group_finished"
            );
            return None;
        }
        self.move_step(next)
    }

    /// Step back within the current group, clamped to `[0, len - 1]`
    pub fn step_prev(&mut self, current: usize, catalog: &StepCatalog) -> Option<Transition> {
        if !self.is_running {
            return None;
        }
        let last = catalog.group_len(self.group_index).saturating_sub(1);
        let prev = current.saturating_sub(1).min(last);
        self.move_step(prev)
    }

    /// Move to the next group, or complete the tour after the last one
    pub fn group_finished(&mut self, catalog: &StepCatalog) -> Option<Transition> {
        if !self.is_running {
            return None;
        }
        let from = self.group_index;
        if from + 1 < catalog.len() {
            self.group_index = from + 1;
            self.step_index = 0;
            Some(Transition::GroupChanged { from, to: from + 1 })
        } else {
            self.complete(CompletionReason::Finished)
        }
    }

    /// Abandon the tour from any position
    pub fn skip(&mut self) -> Option<Transition> {
        self.complete(CompletionReason::Skipped)
    }

    /// Dismiss the tour from any position
    pub fn close(&mut self) -> Option<Transition> {
        self.complete(CompletionReason::Closed)
    }

    fn activate(&mut self) {
        self.is_running = true;
        self.group_index = 0;
        self.step_index = 0;
    }

    fn move_step(&mut self, to: usize) -> Option<Transition> {
        let from = self.step_index;
        if from == to {
            return None;
        }
        self.step_index = to;
        Some(Transition::StepChanged {
            group: self.group_index,
            from,
            to,
        })
    }

    fn complete(&mut self, reason: CompletionReason) -> Option<Transition> {
        if !self.is_running {
            return None;
        }
        self.is_running = false;
        self.completed = true;
        Some(Transition::Completed { reason })
    }
}
