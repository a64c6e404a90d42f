//! Iteration window model.
//!
//! Given the ordered team schedule and a requested window size, computes
//! which contiguous sub-window of iterations is visible. `None` options
//! mean "show all" (unbounded window).
//!
//! # Invariants
//!
//! For any `Some(options)` produced here:
//!
//! - `0 <= start_index <= end_index <= total_iterations - 1`
//! - `end_index - start_index + 1 == count`
//! - `count == min(requested, total_iterations)`
//!
//! A shift that would cross either boundary is a **no-op**, never a clamp:
//! the window only translates, it never shrinks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::IterationSet;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Project/team the window belongs to; carried into the persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamScope {
    pub project_id: String,
    pub team_id: String,
}

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    /// Unbounded window — every iteration is a column.
    All,
    /// Fixed-size window centered on the current iteration.
    Count(usize),
}

/// The visible-window descriptor. Derived state, persisted between
/// sessions, and re-clamped on restore if the schedule changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationWindowOptions {
    /// Effective window size after clamping to the schedule length.
    pub count: usize,
    /// The size originally requested, kept so a later restore against a
    /// longer schedule can grow back.
    pub original_count: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub total_iterations: usize,
    pub project_id: String,
    pub team_id: String,
}

impl IterationWindowOptions {
    /// Whether the window can translate one step toward the schedule start.
    #[must_use]
    pub const fn can_shift_left(&self) -> bool {
        self.start_index > 0
    }

    /// Whether the window can translate one step toward the schedule end.
    #[must_use]
    pub const fn can_shift_right(&self) -> bool {
        self.end_index + 1 < self.total_iterations
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Compute the visible window for a request.
///
/// `All` (and an empty schedule) yield `None`. A fixed count is centered on
/// the iteration marked current (position 0 if none is marked):
/// `start = cur - floor(count / 2)`, clamped into `0..=total - count` so
/// the window always covers `count` real iterations.
#[must_use]
pub fn compute_window(
    iterations: &IterationSet,
    request: WindowRequest,
    scope: &TeamScope,
) -> Option<IterationWindowOptions> {
    let requested = match request {
        WindowRequest::All => return None,
        WindowRequest::Count(n) => n,
    };
    let total = iterations.len();
    if total == 0 || requested == 0 {
        return None;
    }

    let count = requested.min(total);
    let current = iterations.current_index().unwrap_or(0);
    let start_index = current.saturating_sub(count / 2).min(total - count);
    let end_index = start_index + count - 1;

    Some(IterationWindowOptions {
        count,
        original_count: requested,
        start_index,
        end_index,
        total_iterations: total,
        project_id: scope.project_id.clone(),
        team_id: scope.team_id.clone(),
    })
}

/// Translate the window toward the schedule start.
///
/// Refuses the move (returns the options unchanged) if it would push
/// `start_index` below 0.
#[must_use]
pub fn shift_left(options: &IterationWindowOptions, by: usize) -> IterationWindowOptions {
    let mut shifted = options.clone();
    if options.start_index >= by {
        shifted.start_index = options.start_index - by;
        shifted.end_index = shifted.start_index + options.count - 1;
    } else {
        debug!(start = options.start_index, by, "shift left refused");
    }
    shifted
}

/// Translate the window toward the schedule end.
///
/// Refuses the move if it would push `end_index` at or beyond the schedule
/// length.
#[must_use]
pub fn shift_right(options: &IterationWindowOptions, by: usize) -> IterationWindowOptions {
    let mut shifted = options.clone();
    if options.end_index + by < options.total_iterations {
        shifted.end_index = options.end_index + by;
        shifted.start_index = shifted.end_index + 1 - options.count;
    } else {
        debug!(end = options.end_index, by, "shift right refused");
    }
    shifted
}

/// Rehydrate previously persisted options against the current schedule.
///
/// If the schedule shrank below the stored window (count too large, or the
/// stored indices out of range) the window is recomputed centered on the
/// current iteration with the reduced count. An empty schedule yields
/// `None` (show all of nothing).
#[must_use]
pub fn restore(
    stored: IterationWindowOptions,
    iterations: &IterationSet,
    scope: &TeamScope,
) -> Option<IterationWindowOptions> {
    let total = iterations.len();
    if total == 0 {
        return None;
    }

    if stored.count > total || stored.end_index >= total {
        debug!(
            stored_count = stored.count,
            stored_end = stored.end_index,
            total,
            "stored window no longer fits; recentering"
        );
        let recomputed = compute_window(iterations, WindowRequest::Count(stored.count), scope);
        return recomputed.map(|mut options| {
            options.original_count = stored.original_count.max(stored.count);
            options
        });
    }

    Some(IterationWindowOptions {
        total_iterations: total,
        ..stored
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
