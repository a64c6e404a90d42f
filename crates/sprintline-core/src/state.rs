//! Timeline state record and its action API.
//!
//! The state is the single source every derivation reads from. It is only
//! edited through [`TimelineState::apply`] (incremental UI events) and
//! [`TimelineState::apply_initial_load`] (the one-shot commit at the end of
//! a fetch), so concurrent derivations never observe a half-applied
//! update.
//!
//! # The override session singleton
//!
//! At most one drag/resize session exists store-wide. `OverrideStarted`
//! silently supersedes a session belonging to another item;
//! `OverrideEnded` is the *only* close path (there is no timeout-based
//! expiry — a stuck session is harmless because the next start supersedes
//! it, and every other item resolves to its stored span regardless).
//!
//! # Save lifecycle
//!
//! `SaveStarted` → `SaveSucceeded | SaveFailed`. The stored span is only
//! touched on success, so a failure needs no revert: the pre-edit span was
//! never overwritten, and the failure message lands as an inline error on
//! the affected item.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::model::{
    CommittedOverride, Iteration, IterationId, IterationSet, OverrideSession, WorkItem, WorkItemId,
    WorkItemLink,
};
use crate::window::{self, IterationWindowOptions, TeamScope, WindowRequest};

// ---------------------------------------------------------------------------
// InitialLoad
// ---------------------------------------------------------------------------

/// Everything a successful fetch produces, committed to the state in a
/// single step. Built by the fetch orchestration; a failed fetch never
/// constructs one, so the store is never partially populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialLoad {
    pub scope: TeamScope,
    pub iterations: Vec<Iteration>,
    pub work_items: Vec<WorkItem>,
    pub links: Vec<WorkItemLink>,
    pub current_level_ids: Vec<WorkItemId>,
    pub parent_level_ids: Vec<WorkItemId>,
    pub child_level_ids: Vec<WorkItemId>,
    /// Persisted window options, not yet re-clamped; the commit runs them
    /// through [`window::restore`] against the fetched schedule.
    pub display_options: Option<IterationWindowOptions>,
    pub committed_overrides: HashMap<WorkItemId, CommittedOverride>,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Every incremental edit the UI layer can request.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineAction {
    LoadingChanged(bool),
    /// Terminal fetch failure; the message is kept verbatim.
    LoadFailed { message: String },
    /// Request a fixed-size window centered on the current iteration.
    DisplayCountChanged { count: usize },
    /// Back to the unbounded window.
    DisplayAll,
    WindowShiftedLeft { by: usize },
    WindowShiftedRight { by: usize },
    /// Begin a drag/resize session. Supersedes any existing session.
    OverrideStarted { session: OverrideSession },
    /// Retarget the dragged endpoint at the hovered iteration.
    OverrideHovered { iteration_id: IterationId },
    /// Close the session without committing; purely visual, the stored
    /// span is untouched.
    OverrideEnded,
    /// Commit a pinned span for one item (drag commit or settings
    /// rehydration). Clears a session targeting the same item.
    OverridePinned {
        work_item_id: WorkItemId,
        pinned: CommittedOverride,
    },
    /// Drop a pinned span (user removal, or rollback after a failed
    /// persist). Restores the stored span exactly.
    OverrideCleared { work_item_id: WorkItemId },
    SaveStarted { work_item_ids: Vec<WorkItemId> },
    /// The server accepted the move; stored scheduling references are
    /// rewritten to the new iteration path.
    SaveSucceeded {
        work_item_ids: Vec<WorkItemId>,
        iteration_path: String,
    },
    /// The server rejected the move; inline error per affected item.
    SaveFailed {
        work_item_ids: Vec<WorkItemId>,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// TimelineState
// ---------------------------------------------------------------------------

/// The whole session state for one team's timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineState {
    pub scope: TeamScope,
    pub work_items: HashMap<WorkItemId, WorkItem>,
    pub links: Vec<WorkItemLink>,
    /// Items at the displayed backlog level (the grid rows).
    pub current_level_ids: HashSet<WorkItemId>,
    /// Items one level up (row grouping).
    pub parent_level_ids: HashSet<WorkItemId>,
    /// Items one level down (rollup and sub-grid only).
    pub child_level_ids: HashSet<WorkItemId>,
    pub iterations: IterationSet,
    /// `None` means show-all.
    pub display_options: Option<IterationWindowOptions>,
    pub committed_overrides: HashMap<WorkItemId, CommittedOverride>,
    pub override_session: Option<OverrideSession>,
    pub loading: bool,
    pub error: Option<String>,
    pub saving: HashSet<WorkItemId>,
    pub save_errors: HashMap<WorkItemId, String>,
}

impl TimelineState {
    /// Fresh state for a team, in the loading phase.
    #[must_use]
    pub fn loading(scope: TeamScope) -> Self {
        Self {
            scope,
            loading: true,
            ..Self::default()
        }
    }

    /// Commit a completed fetch wholesale. Replaces all entity
    /// collections, re-clamps the persisted window against the fetched
    /// schedule, and leaves the loading phase.
    pub fn apply_initial_load(&mut self, load: InitialLoad) {
        let iterations = IterationSet::new(load.iterations);
        self.display_options = load
            .display_options
            .and_then(|stored| window::restore(stored, &iterations, &load.scope));
        self.scope = load.scope;
        self.work_items = load.work_items.into_iter().map(|w| (w.id, w)).collect();
        self.links = load.links;
        self.current_level_ids = load.current_level_ids.into_iter().collect();
        self.parent_level_ids = load.parent_level_ids.into_iter().collect();
        self.child_level_ids = load.child_level_ids.into_iter().collect();
        self.iterations = iterations;
        self.committed_overrides = load.committed_overrides;
        self.override_session = None;
        self.loading = false;
        self.error = None;
        self.saving.clear();
        self.save_errors.clear();
    }

    /// Apply one incremental action. Infallible: events that do not make
    /// sense in the current state (hover with no session, shift with no
    /// window) are ignored with a trace, per the silent-exclusion policy.
    pub fn apply(&mut self, action: TimelineAction) {
        match action {
            TimelineAction::LoadingChanged(loading) => self.loading = loading,
            TimelineAction::LoadFailed { message } => {
                self.loading = false;
                self.error = Some(message);
            }
            TimelineAction::DisplayCountChanged { count } => {
                self.display_options = window::compute_window(
                    &self.iterations,
                    WindowRequest::Count(count),
                    &self.scope,
                );
            }
            TimelineAction::DisplayAll => self.display_options = None,
            TimelineAction::WindowShiftedLeft { by } => {
                if let Some(options) = &self.display_options {
                    self.display_options = Some(window::shift_left(options, by));
                }
            }
            TimelineAction::WindowShiftedRight { by } => {
                if let Some(options) = &self.display_options {
                    self.display_options = Some(window::shift_right(options, by));
                }
            }
            TimelineAction::OverrideStarted { session } => self.start_override(session),
            TimelineAction::OverrideHovered { iteration_id } => self.hover_override(&iteration_id),
            TimelineAction::OverrideEnded => self.override_session = None,
            TimelineAction::OverridePinned {
                work_item_id,
                pinned,
            } => {
                self.committed_overrides.insert(work_item_id, pinned);
                self.save_errors.remove(&work_item_id);
                self.close_session_for(work_item_id);
            }
            TimelineAction::OverrideCleared { work_item_id } => {
                self.committed_overrides.remove(&work_item_id);
                self.close_session_for(work_item_id);
            }
            TimelineAction::SaveStarted { work_item_ids } => {
                for id in work_item_ids {
                    self.saving.insert(id);
                    self.save_errors.remove(&id);
                }
            }
            TimelineAction::SaveSucceeded {
                work_item_ids,
                iteration_path,
            } => {
                for id in work_item_ids {
                    self.saving.remove(&id);
                    if let Some(item) = self.work_items.get_mut(&id) {
                        item.iteration_path.clone_from(&iteration_path);
                    }
                }
            }
            TimelineAction::SaveFailed {
                work_item_ids,
                message,
            } => {
                for id in work_item_ids {
                    self.saving.remove(&id);
                    self.save_errors.insert(id, message.clone());
                }
            }
        }
    }

    /// In-progress items at the displayed backlog level. Empty means the
    /// "no work items" terminal state.
    pub fn current_level_items(&self) -> impl Iterator<Item = &WorkItem> {
        self.current_level_ids
            .iter()
            .filter_map(|id| self.work_items.get(id))
            .filter(|item| item.in_progress)
    }

    #[must_use]
    pub fn work_item(&self, id: WorkItemId) -> Option<&WorkItem> {
        self.work_items.get(&id)
    }

    fn start_override(&mut self, session: OverrideSession) {
        if let Some(existing) = &self.override_session
            && existing.work_item_id != session.work_item_id
        {
            debug!(
                superseded = existing.work_item_id,
                started = session.work_item_id,
                "override session superseded"
            );
        }
        self.override_session = Some(session);
    }

    fn hover_override(&mut self, iteration_id: &str) {
        let Some(session) = &mut self.override_session else {
            debug!(iteration_id, "hover without an active session ignored");
            return;
        };
        if self.iterations.ordinal_of(iteration_id).is_none() {
            debug!(iteration_id, "hover over unknown iteration ignored");
            return;
        }
        session.hover = Some(iteration_id.to_string());
        if session.changing_start {
            session.proposed_start = iteration_id.to_string();
        } else {
            session.proposed_end = iteration_id.to_string();
        }
    }

    fn close_session_for(&mut self, work_item_id: WorkItemId) {
        if self
            .override_session
            .as_ref()
            .is_some_and(|s| s.work_item_id == work_item_id)
        {
            self.override_session = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
