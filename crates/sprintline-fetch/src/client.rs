//! The REST seam.
//!
//! Everything the orchestration needs from the work-tracking service, as
//! an object-safe async trait. The concrete transport — HTTP client, query
//! language construction, auth — lives behind implementations of this
//! trait and is out of scope here.

use async_trait::async_trait;

use sprintline_core::model::WorkItemId;

use crate::payload::{BacklogConfiguration, BacklogLevelRecord, IterationRecord, LinkRecord, WorkItemRecord};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A transport-level failure. The message is whatever the service or the
/// transport produced; callers surface it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// Direction of a hierarchy link query relative to the source set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    /// Hierarchy-Forward: links to items one tier down.
    ChildrenOf,
    /// Hierarchy-Reverse: links to items one tier up.
    ParentsOf,
}

/// Async seam to the work-tracking service.
#[async_trait]
pub trait WorkTrackingClient: Send + Sync {
    /// Capability probe: old servers predate the backlog configuration
    /// API and cannot host the view at all.
    async fn supports_backlog_configuration(&self) -> Result<bool, TransportError>;

    async fn backlog_configuration(&self) -> Result<BacklogConfiguration, TransportError>;

    /// The team's iteration schedule, in chronological order.
    async fn team_iterations(&self) -> Result<Vec<IterationRecord>, TransportError>;

    /// Ids of in-progress items at one backlog level, in backlog order.
    async fn query_level_item_ids(
        &self,
        level: &BacklogLevelRecord,
    ) -> Result<Vec<WorkItemId>, TransportError>;

    /// Hierarchy links from `source_ids` toward `target_level`.
    async fn query_links(
        &self,
        source_ids: &[WorkItemId],
        direction: LinkDirection,
        target_level: &BacklogLevelRecord,
    ) -> Result<Vec<LinkRecord>, TransportError>;

    /// Page full records for a set of ids. Unknown ids are omitted, not
    /// an error.
    async fn page_work_items(
        &self,
        ids: &[WorkItemId],
    ) -> Result<Vec<WorkItemRecord>, TransportError>;

    /// Persist an iteration move for a set of items.
    async fn save_iteration(
        &self,
        ids: &[WorkItemId],
        iteration_path: &str,
    ) -> Result<(), TransportError>;
}
