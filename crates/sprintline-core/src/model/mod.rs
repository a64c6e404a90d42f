//! Work item and link records.
//!
//! These are plain value types: the store owns one copy for the session and
//! replaces it wholesale on re-fetch. Hierarchy is *not* modeled with
//! parent/child pointers — links stay a flat edge list and the forest is
//! recomputed from it on every derivation pass, so a malformed payload can
//! never wedge a cyclic structure into the entity model.

use serde::{Deserialize, Serialize};
use std::fmt;

mod iteration;

pub use iteration::{
    CommittedOverride, DurationKind, Iteration, IterationDuration, IterationId, IterationSet,
    IterationSpan, OverrideSession,
};

/// Work item identity as assigned by the remote tracking system.
pub type WorkItemId = u32;

// ---------------------------------------------------------------------------
// WorkItem
// ---------------------------------------------------------------------------

/// A single work item as held in the timeline state.
///
/// `in_progress` is computed at load time from the backlog configuration's
/// mapped meta-states; the raw `state` name is kept for display. `order` is
/// the numeric backlog rank used for sibling sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: WorkItemId,
    pub title: String,
    pub item_type: String,
    pub state: String,
    pub in_progress: bool,
    pub order: f64,
    /// Raw scheduling reference, resolved against [`IterationSet`] paths.
    pub iteration_path: String,
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Relation kind carried on a work item link.
///
/// Only the two hierarchy kinds participate in forest building; anything
/// else is kept as [`LinkKind::Other`] for diagnostics and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    HierarchyForward,
    HierarchyReverse,
    Other(String),
}

impl LinkKind {
    /// Parse a relation reference name from the remote system.
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        match reference {
            "System.LinkTypes.Hierarchy-Forward" => Self::HierarchyForward,
            "System.LinkTypes.Hierarchy-Reverse" => Self::HierarchyReverse,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns `true` for the two hierarchy kinds.
    #[must_use]
    pub const fn is_hierarchy(&self) -> bool {
        matches!(self, Self::HierarchyForward | Self::HierarchyReverse)
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HierarchyForward => f.write_str("System.LinkTypes.Hierarchy-Forward"),
            Self::HierarchyReverse => f.write_str("System.LinkTypes.Hierarchy-Reverse"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Directed edge between two work items.
///
/// For `HierarchyForward`, `source` is the parent of `target`; for
/// `HierarchyReverse` the roles are swapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemLink {
    pub source: WorkItemId,
    pub target: WorkItemId,
    pub kind: LinkKind,
}

impl WorkItemLink {
    /// Resolve the edge to a `(parent, child)` pair, if it is a hierarchy
    /// link at all.
    #[must_use]
    pub fn parent_child(&self) -> Option<(WorkItemId, WorkItemId)> {
        match self.kind {
            LinkKind::HierarchyForward => Some((self.source, self.target)),
            LinkKind::HierarchyReverse => Some((self.target, self.source)),
            LinkKind::Other(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_kind_parse_forward() {
        let kind = LinkKind::parse("System.LinkTypes.Hierarchy-Forward");
        assert_eq!(kind, LinkKind::HierarchyForward);
        assert!(kind.is_hierarchy());
    }

    #[test]
    fn link_kind_parse_reverse() {
        let kind = LinkKind::parse("System.LinkTypes.Hierarchy-Reverse");
        assert_eq!(kind, LinkKind::HierarchyReverse);
        assert!(kind.is_hierarchy());
    }

    #[test]
    fn link_kind_parse_other_preserved() {
        let kind = LinkKind::parse("System.LinkTypes.Related");
        assert_eq!(kind, LinkKind::Other("System.LinkTypes.Related".into()));
        assert!(!kind.is_hierarchy());
        assert_eq!(kind.to_string(), "System.LinkTypes.Related");
    }

    #[test]
    fn parent_child_forward() {
        let link = WorkItemLink {
            source: 1,
            target: 2,
            kind: LinkKind::HierarchyForward,
        };
        assert_eq!(link.parent_child(), Some((1, 2)));
    }

    #[test]
    fn parent_child_reverse_swaps_roles() {
        let link = WorkItemLink {
            source: 2,
            target: 1,
            kind: LinkKind::HierarchyReverse,
        };
        assert_eq!(link.parent_child(), Some((1, 2)));
    }

    #[test]
    fn parent_child_other_is_none() {
        let link = WorkItemLink {
            source: 1,
            target: 2,
            kind: LinkKind::Other("System.LinkTypes.Related".into()),
        };
        assert_eq!(link.parent_child(), None);
    }
}
