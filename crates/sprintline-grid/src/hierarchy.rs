//! Work item hierarchy builder.
//!
//! Builds the display forest from flat collections: work item records plus
//! a flat edge list. The forest is ephemeral — recomputed on every
//! derivation pass — and no node ever holds a pointer back to its parent,
//! so cyclic payloads cannot wedge a cycle into the entity model.
//!
//! # Rules
//!
//! - Only hierarchy links whose **both** endpoints resolve to fetched work
//!   items participate; dangling links are dropped silently (the remote
//!   system may return partial link data under paging/locking).
//! - A child attaches to at most one parent; the first link wins.
//! - Sibling order is the numeric backlog rank ascending, ties broken by
//!   id ascending — deterministic and idempotent.
//! - Roots are the parent-tier items plus every current-tier item without
//!   a resolvable parent link.
//! - A node's duration is its own stored (or pinned) span when it has no
//!   children in this forest, else the union span of its descendants,
//!   computed bottom-up in one post-order pass. A visited-set guard breaks
//!   cycles from malformed input.

use std::collections::{HashMap, HashSet};

use sprintline_core::model::{
    CommittedOverride, DurationKind, IterationDuration, IterationSet, IterationSpan, WorkItem,
    WorkItemId,
};
use sprintline_core::state::TimelineState;
use tracing::{debug, instrument};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which backlog tier a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BacklogTier {
    /// One level above the displayed backlog (row grouping).
    Parent,
    /// The displayed backlog level (the grid rows).
    Current,
    /// One level below; feeds rollup and the sub-grid only.
    Child,
}

/// One node of the display forest.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemNode {
    pub item: WorkItem,
    pub tier: BacklogTier,
    /// Span this node occupies, with provenance.
    pub duration: IterationDuration,
    pub children: Vec<WorkItemNode>,
}

impl WorkItemNode {
    #[must_use]
    pub fn id(&self) -> WorkItemId {
        self.item.id
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build the display forest for the current state.
#[must_use]
#[instrument(skip(state), fields(items = state.work_items.len(), links = state.links.len()))]
pub fn build_hierarchy(state: &TimelineState) -> Vec<WorkItemNode> {
    let mut children_of: HashMap<WorkItemId, Vec<WorkItemId>> = HashMap::new();
    let mut parent_of: HashMap<WorkItemId, WorkItemId> = HashMap::new();
    let mut seen_edges: HashSet<(WorkItemId, WorkItemId)> = HashSet::new();

    for link in &state.links {
        let Some((parent, child)) = link.parent_child() else {
            continue;
        };
        if !state.work_items.contains_key(&parent) || !state.work_items.contains_key(&child) {
            debug!(parent, child, "dangling link dropped");
            continue;
        }
        if !seen_edges.insert((parent, child)) {
            continue;
        }
        if let Some(existing) = parent_of.get(&child) {
            if *existing != parent {
                debug!(child, existing, parent, "second parent link dropped");
            }
            continue;
        }
        parent_of.insert(child, parent);
        children_of.entry(parent).or_default().push(child);
    }

    let mut root_ids: Vec<WorkItemId> = state
        .work_items
        .keys()
        .copied()
        .filter(|id| {
            state.parent_level_ids.contains(id)
                || (state.current_level_ids.contains(id) && !parent_of.contains_key(id))
        })
        .collect();
    sort_siblings(&mut root_ids, state);

    let mut visited: HashSet<WorkItemId> = HashSet::new();
    root_ids
        .into_iter()
        .filter_map(|id| build_node(id, state, &children_of, &mut visited))
        .collect()
}

/// Locate a node by id anywhere in the forest (for sub-grid views).
#[must_use]
pub fn find_node(forest: &[WorkItemNode], id: WorkItemId) -> Option<&WorkItemNode> {
    for node in forest {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, id) {
            return Some(found);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn build_node(
    id: WorkItemId,
    state: &TimelineState,
    children_of: &HashMap<WorkItemId, Vec<WorkItemId>>,
    visited: &mut HashSet<WorkItemId>,
) -> Option<WorkItemNode> {
    if !visited.insert(id) {
        debug!(id, "cycle guard: node already placed, link dropped");
        return None;
    }
    let item = state.work_items.get(&id)?;

    let mut child_ids = children_of.get(&id).cloned().unwrap_or_default();
    sort_siblings(&mut child_ids, state);

    let children: Vec<WorkItemNode> = child_ids
        .into_iter()
        .filter_map(|child| build_node(child, state, children_of, visited))
        .collect();

    let duration = node_duration(item, &children, state);

    Some(WorkItemNode {
        item: item.clone(),
        tier: tier_of(id, state),
        duration,
        children,
    })
}

/// Rollup rule: descendants win, then the pinned span, then the item's own
/// scheduled iteration, then the backlog (no span).
fn node_duration(
    item: &WorkItem,
    children: &[WorkItemNode],
    state: &TimelineState,
) -> IterationDuration {
    let rollup = children
        .iter()
        .filter_map(|child| child.duration.visible())
        .reduce(IterationSpan::union);
    if let Some(span) = rollup {
        return IterationDuration {
            span: Some(span),
            kind: DurationKind::ChildRollup,
        };
    }

    if let Some(pinned) = state.committed_overrides.get(&item.id)
        && let Some(span) = pinned_span(pinned, &state.iterations)
    {
        return IterationDuration {
            span: Some(span),
            kind: DurationKind::UserOverride {
                user: pinned.user.clone(),
            },
        };
    }

    state.iterations.ordinal_of_path(&item.iteration_path).map_or_else(
        IterationDuration::backlog,
        |ordinal| IterationDuration {
            span: Some(IterationSpan::point(ordinal)),
            kind: DurationKind::OwnIteration,
        },
    )
}

/// Resolve a pinned record against the current schedule. A pin whose
/// endpoints no longer resolve (or resolve inverted) is excluded, not an
/// error — the schedule may have changed since it was saved.
fn pinned_span(pinned: &CommittedOverride, iterations: &IterationSet) -> Option<IterationSpan> {
    let start = iterations.ordinal_of(&pinned.start_iteration_id);
    let end = iterations.ordinal_of(&pinned.end_iteration_id);
    match (start, end) {
        (Some(start), Some(end)) => {
            let span = IterationSpan::new(start, end);
            if span.is_none() {
                debug!(start, end, "inverted pinned span excluded");
            }
            span
        }
        _ => {
            debug!(
                start_id = %pinned.start_iteration_id,
                end_id = %pinned.end_iteration_id,
                "pinned span no longer resolves; excluded"
            );
            None
        }
    }
}

fn tier_of(id: WorkItemId, state: &TimelineState) -> BacklogTier {
    if state.parent_level_ids.contains(&id) {
        BacklogTier::Parent
    } else if state.child_level_ids.contains(&id) {
        BacklogTier::Child
    } else {
        BacklogTier::Current
    }
}

/// Stable sibling order: backlog rank ascending, ties by id. A NaN rank
/// sorts last so the order stays total.
fn sort_siblings(ids: &mut [WorkItemId], state: &TimelineState) {
    ids.sort_by(|a, b| {
        let rank = |id: &WorkItemId| {
            state
                .work_items
                .get(id)
                .map_or(f64::INFINITY, |item| item.order)
        };
        let (ra, rb) = (rank(a), rank(b));
        ra.partial_cmp(&rb)
            .unwrap_or_else(|| ra.is_nan().cmp(&rb.is_nan()))
            .then_with(|| a.cmp(b))
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
