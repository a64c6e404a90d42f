//! Offline client over a captured snapshot.
//!
//! A [`Snapshot`] is the full set of raw payloads one load would fetch,
//! as a single JSON document. [`FixtureClient`] answers the client trait
//! from it deterministically, which makes it the driver for the CLI and
//! for orchestration tests — no transport, no auth, same code path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sprintline_core::model::{LinkKind, WorkItemId};

use crate::client::{LinkDirection, TransportError, WorkTrackingClient};
use crate::payload::{
    BacklogConfiguration, BacklogLevelRecord, IterationRecord, LinkRecord, WorkItemRecord,
};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything one load would fetch, captured as a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub project: String,
    pub team: String,
    pub backlog: BacklogConfiguration,
    pub iterations: Vec<IterationRecord>,
    pub work_items: Vec<WorkItemRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

impl Snapshot {
    /// Parse a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for a malformed document.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

// ---------------------------------------------------------------------------
// FixtureClient
// ---------------------------------------------------------------------------

/// A [`WorkTrackingClient`] that serves a snapshot.
#[derive(Debug, Clone)]
pub struct FixtureClient {
    snapshot: Snapshot,
}

impl FixtureClient {
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn item_type_of(&self, id: WorkItemId) -> Option<&str> {
        self.snapshot
            .work_items
            .iter()
            .find(|w| w.id == id)
            .map(|w| w.item_type.as_str())
    }
}

#[async_trait]
impl WorkTrackingClient for FixtureClient {
    async fn supports_backlog_configuration(&self) -> Result<bool, TransportError> {
        Ok(true)
    }

    async fn backlog_configuration(&self) -> Result<BacklogConfiguration, TransportError> {
        Ok(self.snapshot.backlog.clone())
    }

    async fn team_iterations(&self) -> Result<Vec<IterationRecord>, TransportError> {
        Ok(self.snapshot.iterations.clone())
    }

    async fn query_level_item_ids(
        &self,
        level: &BacklogLevelRecord,
    ) -> Result<Vec<WorkItemId>, TransportError> {
        Ok(self
            .snapshot
            .work_items
            .iter()
            .filter(|w| level.has_type(&w.item_type))
            .map(|w| w.id)
            .collect())
    }

    async fn query_links(
        &self,
        source_ids: &[WorkItemId],
        direction: LinkDirection,
        target_level: &BacklogLevelRecord,
    ) -> Result<Vec<LinkRecord>, TransportError> {
        let wanted = match direction {
            LinkDirection::ChildrenOf => LinkKind::HierarchyForward,
            LinkDirection::ParentsOf => LinkKind::HierarchyReverse,
        };
        Ok(self
            .snapshot
            .links
            .iter()
            .filter_map(|record| {
                let kind = LinkKind::parse(&record.relation_kind);
                // The snapshot stores edges parent→child; answer reverse
                // queries by flipping them, the way the service's link
                // query mode does.
                let flipped;
                let candidate = match (&kind, &wanted) {
                    (LinkKind::HierarchyForward, LinkKind::HierarchyForward) => record,
                    (LinkKind::HierarchyForward, LinkKind::HierarchyReverse) => {
                        flipped = LinkRecord {
                            source_id: record.target_id,
                            target_id: record.source_id,
                            relation_kind: "System.LinkTypes.Hierarchy-Reverse".into(),
                        };
                        &flipped
                    }
                    _ => return None,
                };
                (source_ids.contains(&candidate.source_id)
                    && self
                        .item_type_of(candidate.target_id)
                        .is_some_and(|t| target_level.has_type(t)))
                .then(|| candidate.clone())
            })
            .collect())
    }

    async fn page_work_items(
        &self,
        ids: &[WorkItemId],
    ) -> Result<Vec<WorkItemRecord>, TransportError> {
        Ok(self
            .snapshot
            .work_items
            .iter()
            .filter(|w| ids.contains(&w.id))
            .cloned()
            .collect())
    }

    async fn save_iteration(
        &self,
        _ids: &[WorkItemId],
        _iteration_path: &str,
    ) -> Result<(), TransportError> {
        // Snapshots are immutable; the move is accepted and forgotten.
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{MetaState, WorkItemTypeStates};
    use std::collections::HashMap;

    fn snapshot() -> Snapshot {
        Snapshot {
            project: "proj".into(),
            team: "team".into(),
            backlog: BacklogConfiguration {
                portfolio_levels: vec![BacklogLevelRecord {
                    name: "Features".into(),
                    rank: 1,
                    work_item_types: vec!["Feature".into()],
                }],
                requirement_level: BacklogLevelRecord {
                    name: "Stories".into(),
                    rank: 0,
                    work_item_types: vec!["User Story".into()],
                },
                type_states: vec![WorkItemTypeStates {
                    work_item_type: "Feature".into(),
                    states: HashMap::from([("Active".to_string(), MetaState::InProgress)]),
                }],
            },
            iterations: vec![],
            work_items: vec![
                WorkItemRecord {
                    id: 11,
                    title: "Feature".into(),
                    item_type: "Feature".into(),
                    state: "Active".into(),
                    order_value: 1.0,
                    iteration_path: String::new(),
                },
                WorkItemRecord {
                    id: 21,
                    title: "Story".into(),
                    item_type: "User Story".into(),
                    state: "Active".into(),
                    order_value: 2.0,
                    iteration_path: String::new(),
                },
            ],
            links: vec![LinkRecord {
                source_id: 11,
                target_id: 21,
                relation_kind: "System.LinkTypes.Hierarchy-Forward".into(),
            }],
        }
    }

    #[tokio::test]
    async fn level_query_filters_by_type() {
        let client = FixtureClient::new(snapshot());
        let level = client.snapshot().backlog.portfolio_levels[0].clone();
        let ids = client.query_level_item_ids(&level).await.expect("ids");
        assert_eq!(ids, vec![11]);
    }

    #[tokio::test]
    async fn forward_link_query_scopes_to_target_level() {
        let client = FixtureClient::new(snapshot());
        let stories = client.snapshot().backlog.requirement_level.clone();
        let links = client
            .query_links(&[11], LinkDirection::ChildrenOf, &stories)
            .await
            .expect("links");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target_id, 21);
    }

    #[tokio::test]
    async fn reverse_link_query_flips_stored_edges() {
        let client = FixtureClient::new(snapshot());
        let features = client.snapshot().backlog.portfolio_levels[0].clone();
        let links = client
            .query_links(&[21], LinkDirection::ParentsOf, &features)
            .await
            .expect("links");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].source_id, 21);
        assert_eq!(links[0].target_id, 11);
        assert_eq!(links[0].relation_kind, "System.LinkTypes.Hierarchy-Reverse");
    }

    #[tokio::test]
    async fn paging_omits_unknown_ids() {
        let client = FixtureClient::new(snapshot());
        let records = client.page_work_items(&[11, 999]).await.expect("records");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn snapshot_parses_from_json() {
        let raw = serde_json::to_string(&snapshot()).expect("serialize");
        let parsed = Snapshot::from_json(&raw).expect("parse");
        assert_eq!(parsed, snapshot());
    }
}
