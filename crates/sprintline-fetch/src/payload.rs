//! Raw payload records from the work-tracking service.
//!
//! Field names mirror the wire shapes (camelCase); the query language and
//! transport that produce them live behind [`crate::client`]. Conversion
//! into core model types happens here so the orchestration stays a plain
//! sequence of stages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use sprintline_core::model::{Iteration, LinkKind, WorkItem, WorkItemId, WorkItemLink};

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// One work item row as paged from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemRecord {
    pub id: WorkItemId,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub state: String,
    #[serde(default)]
    pub order_value: f64,
    #[serde(default)]
    pub iteration_path: String,
}

/// One link row from a link query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub source_id: WorkItemId,
    pub target_id: WorkItemId,
    pub relation_kind: String,
}

/// One iteration row from the team settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub start_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub finish_date: Option<chrono::NaiveDate>,
}

// ---------------------------------------------------------------------------
// Backlog configuration
// ---------------------------------------------------------------------------

/// Lifecycle meta-state a raw state name maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaState {
    Proposed,
    InProgress,
    Completed,
}

/// State → meta-state mapping for one work item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemTypeStates {
    pub work_item_type: String,
    pub states: HashMap<String, MetaState>,
}

/// One backlog level: a named tier with its work item types.
///
/// Higher `rank` is higher in the portfolio (epics above features).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogLevelRecord {
    pub name: String,
    pub rank: i32,
    pub work_item_types: Vec<String>,
}

impl BacklogLevelRecord {
    #[must_use]
    pub fn has_type(&self, item_type: &str) -> bool {
        self.work_item_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(item_type))
    }
}

/// The team's backlog configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogConfiguration {
    /// Portfolio tiers (features, epics, …), any order; rank decides.
    pub portfolio_levels: Vec<BacklogLevelRecord>,
    /// The requirement backlog below the lowest portfolio tier.
    pub requirement_level: BacklogLevelRecord,
    pub type_states: Vec<WorkItemTypeStates>,
}

impl BacklogConfiguration {
    /// The tier shown as rows: the named level, or the lowest-ranked
    /// portfolio tier when no name is given.
    #[must_use]
    pub fn display_level(&self, name: Option<&str>) -> Option<&BacklogLevelRecord> {
        match name {
            Some(name) => self
                .portfolio_levels
                .iter()
                .find(|l| l.name.eq_ignore_ascii_case(name)),
            None => self.portfolio_levels.iter().min_by_key(|l| l.rank),
        }
    }

    /// The tier one rank above the given level, if any.
    #[must_use]
    pub fn parent_level_of(&self, level: &BacklogLevelRecord) -> Option<&BacklogLevelRecord> {
        self.portfolio_levels
            .iter()
            .filter(|l| l.rank > level.rank)
            .min_by_key(|l| l.rank)
    }

    /// The tier one rank below, falling back to the requirement backlog.
    #[must_use]
    pub fn child_level_of(&self, level: &BacklogLevelRecord) -> &BacklogLevelRecord {
        self.portfolio_levels
            .iter()
            .filter(|l| l.rank < level.rank)
            .max_by_key(|l| l.rank)
            .unwrap_or(&self.requirement_level)
    }

    /// Whether a `(type, state)` pair maps to the in-progress meta-state.
    #[must_use]
    pub fn is_in_progress(&self, item_type: &str, state: &str) -> bool {
        self.type_states
            .iter()
            .find(|ts| ts.work_item_type.eq_ignore_ascii_case(item_type))
            .and_then(|ts| ts.states.get(state))
            .is_some_and(|meta| *meta == MetaState::InProgress)
    }
}

// ---------------------------------------------------------------------------
// Conversions into the core model
// ---------------------------------------------------------------------------

impl WorkItemRecord {
    /// Convert to the core model, computing the in-progress flag from the
    /// backlog configuration.
    #[must_use]
    pub fn into_work_item(self, config: &BacklogConfiguration) -> WorkItem {
        let in_progress = config.is_in_progress(&self.item_type, &self.state);
        WorkItem {
            id: self.id,
            title: self.title,
            item_type: self.item_type,
            state: self.state,
            in_progress,
            order: self.order_value,
            iteration_path: self.iteration_path,
        }
    }
}

impl From<LinkRecord> for WorkItemLink {
    fn from(record: LinkRecord) -> Self {
        Self {
            source: record.source_id,
            target: record.target_id,
            kind: LinkKind::parse(&record.relation_kind),
        }
    }
}

impl From<IterationRecord> for Iteration {
    fn from(record: IterationRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            path: record.path,
            is_current: record.is_current,
            start_date: record.start_date,
            finish_date: record.finish_date,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
