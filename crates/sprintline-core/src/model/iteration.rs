//! Team iterations, spans, and override records.
//!
//! Insertion order of the team schedule *is* chronological order — no date
//! comparison happens anywhere in the core. The optional start/finish dates
//! are display metadata only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::WorkItemId;

/// Iteration identity, opaque and unique within a team.
pub type IterationId = String;

// ---------------------------------------------------------------------------
// Iteration / IterationSet
// ---------------------------------------------------------------------------

/// One time-box in the team schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    pub id: IterationId,
    pub name: String,
    /// Full path as known to the remote system; work items reference it.
    pub path: String,
    /// At most one iteration per team carries this marker.
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub finish_date: Option<NaiveDate>,
}

/// The ordered team schedule with ordinal lookup.
///
/// Duplicate ids in the input keep their first occurrence; later ones are
/// dropped (the remote system does not produce them, but partial payloads
/// under paging may repeat a record).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Iteration>", into = "Vec<Iteration>")]
pub struct IterationSet {
    iterations: Vec<Iteration>,
    ordinals: HashMap<IterationId, usize>,
}

impl IterationSet {
    #[must_use]
    pub fn new(iterations: Vec<Iteration>) -> Self {
        let mut deduped: Vec<Iteration> = Vec::with_capacity(iterations.len());
        let mut ordinals = HashMap::with_capacity(iterations.len());
        for iteration in iterations {
            if ordinals.contains_key(&iteration.id) {
                tracing::debug!(id = %iteration.id, "duplicate iteration dropped");
                continue;
            }
            ordinals.insert(iteration.id.clone(), deduped.len());
            deduped.push(iteration);
        }
        Self {
            iterations: deduped,
            ordinals,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    /// Iteration at a given ordinal position.
    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<&Iteration> {
        self.iterations.get(ordinal)
    }

    /// Ordinal position of an iteration id, if it is part of the schedule.
    #[must_use]
    pub fn ordinal_of(&self, id: &str) -> Option<usize> {
        self.ordinals.get(id).copied()
    }

    /// Ordinal of the iteration whose path matches a work item's raw
    /// scheduling reference.
    #[must_use]
    pub fn ordinal_of_path(&self, path: &str) -> Option<usize> {
        self.iterations.iter().position(|i| i.path == path)
    }

    /// Index of the iteration marked current, if any.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.iterations.iter().position(|i| i.is_current)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Iteration> {
        self.iterations.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Iteration] {
        &self.iterations
    }
}

impl From<Vec<Iteration>> for IterationSet {
    fn from(iterations: Vec<Iteration>) -> Self {
        Self::new(iterations)
    }
}

impl From<IterationSet> for Vec<Iteration> {
    fn from(set: IterationSet) -> Self {
        set.iterations
    }
}

// ---------------------------------------------------------------------------
// IterationSpan
// ---------------------------------------------------------------------------

/// Inclusive ordinal range `[start, end]` into the team schedule.
///
/// The constructor enforces `start <= end`; an inverted pair is not
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationSpan {
    start: usize,
    end: usize,
}

impl IterationSpan {
    /// Create a span; returns `None` for an inverted pair.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Span covering a single iteration.
    #[must_use]
    pub const fn point(ordinal: usize) -> Self {
        Self {
            start: ordinal,
            end: ordinal,
        }
    }

    #[must_use]
    pub const fn start(self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> usize {
        self.end
    }

    /// Number of iterations covered, always >= 1.
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start + 1
    }

    #[must_use]
    pub const fn contains(self, ordinal: usize) -> bool {
        self.start <= ordinal && ordinal <= self.end
    }

    /// Smallest span covering both operands.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for IterationSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "[{}]", self.start)
        } else {
            write!(f, "[{}..{}]", self.start, self.end)
        }
    }
}

// ---------------------------------------------------------------------------
// IterationDuration
// ---------------------------------------------------------------------------

/// How a work item's displayed span was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DurationKind {
    /// The item's path did not resolve to a team iteration; it sits in the
    /// backlog and occupies no column.
    BacklogIteration,
    /// The item's own scheduled iteration.
    OwnIteration,
    /// Union of the spans of the item's descendants.
    ChildRollup,
    /// A user pinned this span, overriding the stored value.
    UserOverride { user: String },
}

/// The span a work item (or its subtree) occupies, plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationDuration {
    pub span: Option<IterationSpan>,
    pub kind: DurationKind,
}

impl IterationDuration {
    /// Duration for an item outside the team schedule.
    #[must_use]
    pub const fn backlog() -> Self {
        Self {
            span: None,
            kind: DurationKind::BacklogIteration,
        }
    }

    #[must_use]
    pub const fn visible(&self) -> Option<IterationSpan> {
        self.span
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// A committed, persisted span pin for one work item.
///
/// This is the record shape rehydrated from the settings store; endpoints
/// are iteration ids, not ordinals, so a changed schedule degrades to
/// silent exclusion rather than a bogus span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedOverride {
    pub start_iteration_id: IterationId,
    pub end_iteration_id: IterationId,
    pub user: String,
}

/// The single in-flight drag/resize session.
///
/// At most one exists store-wide; starting a new session silently
/// supersedes the old one. `changing_start` names the dragged endpoint;
/// hover events retarget that endpoint while the other keeps the stored
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSession {
    pub work_item_id: WorkItemId,
    pub proposed_start: IterationId,
    pub proposed_end: IterationId,
    pub changing_start: bool,
    pub user: String,
    /// Iteration column currently hovered during the drag, for the
    /// drop-target highlight.
    #[serde(default)]
    pub hover: Option<IterationId>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
