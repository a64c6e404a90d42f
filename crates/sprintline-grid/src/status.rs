//! Terminal display status for the view.
//!
//! Degenerate states are explicit named outcomes, not exceptions. The
//! precedence mirrors what a user should see first: a load in flight beats
//! everything, then a fetch failure, then team misconfiguration, then an
//! empty query result.

use serde::Serialize;
use sprintline_core::state::TimelineState;

/// What the presentation layer should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "message")]
pub enum UiStatus {
    /// No data fetched yet; render a spinner.
    Loading,
    /// The load attempt failed; the message is the upstream error,
    /// verbatim.
    Error(String),
    /// The team has no iterations configured; blocking message.
    NoIterations,
    /// The query returned no in-progress items for the displayed level.
    NoWorkItems,
    /// Render the grid.
    Ready,
}

impl UiStatus {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Derive the terminal status for the current state.
#[must_use]
pub fn ui_status(state: &TimelineState) -> UiStatus {
    if state.loading {
        return UiStatus::Loading;
    }
    if let Some(message) = &state.error {
        return UiStatus::Error(message.clone());
    }
    if state.iterations.is_empty() {
        return UiStatus::NoIterations;
    }
    if state.current_level_items().next().is_none() {
        return UiStatus::NoWorkItems;
    }
    UiStatus::Ready
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
