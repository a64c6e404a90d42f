//! The staged initialize task.
//!
//! Reimplements the original effect sequence as an explicit async task
//! with ordered stages:
//!
//! 1. Capability probe (old backends are a configuration error).
//! 2. Parallel fan-out: backlog configuration + team iterations.
//! 3. Resolve the display level and its neighbor tiers.
//! 4. Query the display-level item ids; page and filter their records.
//! 5. Dependent fan-out on those ids: child links + parent links; page
//!    the newly discovered items.
//! 6. Rehydrate persisted window options and pinned overrides.
//! 7. Return one [`InitialLoad`]; the caller commits it in a single step.
//!
//! A failure at any stage short-circuits the remainder and yields exactly
//! one terminal [`FetchError`] — the store is never partially populated.

use std::collections::HashMap;

use sprintline_core::error::{ConfigurationError, FetchError, FetchStage};
use sprintline_core::model::{WorkItem, WorkItemId, WorkItemLink};
use sprintline_core::settings::SettingsStore;
use sprintline_core::state::{InitialLoad, TimelineState};
use sprintline_core::window::TeamScope;
use tracing::{debug, instrument};

use crate::client::{LinkDirection, WorkTrackingClient};
use crate::payload::BacklogConfiguration;

/// What to load and for whom.
#[derive(Debug, Clone, Default)]
pub struct InitializeOptions {
    pub scope: TeamScope,
    /// Backlog level to display; `None` means the lowest portfolio tier.
    pub backlog_level: Option<String>,
}

/// Run the staged load and return the single commit payload.
///
/// # Errors
///
/// [`FetchError::Configuration`] for an unsupported backend, otherwise
/// [`FetchError::Query`] carrying the first failing stage's message
/// verbatim.
#[instrument(skip(client, settings), fields(team = %options.scope.team_id))]
pub async fn initialize(
    client: &dyn WorkTrackingClient,
    settings: &dyn SettingsStore,
    options: &InitializeOptions,
) -> Result<InitialLoad, FetchError> {
    // Stage 1: capability probe.
    let supported = client
        .supports_backlog_configuration()
        .await
        .map_err(|e| FetchError::query(FetchStage::BacklogConfiguration, e.message))?;
    if !supported {
        return Err(ConfigurationError::UnsupportedBackend.into());
    }

    // Stage 2: independent calls in parallel.
    let (config, iteration_records) = tokio::try_join!(
        async {
            client
                .backlog_configuration()
                .await
                .map_err(|e| FetchError::query(FetchStage::BacklogConfiguration, e.message))
        },
        async {
            client
                .team_iterations()
                .await
                .map_err(|e| FetchError::query(FetchStage::TeamIterations, e.message))
        },
    )?;

    // Stage 3: resolve the displayed tier and its neighbors.
    let level = config
        .display_level(options.backlog_level.as_deref())
        .ok_or_else(|| {
            FetchError::query(
                FetchStage::BacklogConfiguration,
                match &options.backlog_level {
                    Some(name) => format!("backlog level '{name}' is not configured"),
                    None => "no portfolio backlog levels are configured".to_string(),
                },
            )
        })?;
    let parent_level = config.parent_level_of(level);
    let child_level = config.child_level_of(level);
    debug!(
        level = %level.name,
        parent = parent_level.map(|l| l.name.as_str()),
        child = %child_level.name,
        "backlog levels resolved"
    );

    // Stage 4: display-level items.
    let level_ids = client
        .query_level_item_ids(level)
        .await
        .map_err(|e| FetchError::query(FetchStage::LevelQuery, e.message))?;
    let mut current_items = page_items(client, &config, &level_ids).await?;
    current_items.retain(|item| {
        let keep = item.in_progress;
        if !keep {
            debug!(id = item.id, "not in progress; dropped from display level");
        }
        keep
    });
    let current_level_ids: Vec<WorkItemId> = current_items.iter().map(|w| w.id).collect();

    // Stage 5: dependent fan-out, gated on the resolved ids.
    let (mut links, parent_level_ids, child_level_ids, mut related_items) = if current_level_ids
        .is_empty()
    {
        (Vec::new(), Vec::new(), Vec::new(), Vec::new())
    } else {
        let (child_links, parent_links) = tokio::try_join!(
            async {
                client
                    .query_links(&current_level_ids, LinkDirection::ChildrenOf, child_level)
                    .await
                    .map_err(|e| FetchError::query(FetchStage::LinkQuery, e.message))
            },
            async {
                match parent_level {
                    Some(parent_level) => client
                        .query_links(&current_level_ids, LinkDirection::ParentsOf, parent_level)
                        .await
                        .map_err(|e| FetchError::query(FetchStage::LinkQuery, e.message)),
                    None => Ok(Vec::new()),
                }
            },
        )?;

        let child_ids: Vec<WorkItemId> = child_links.iter().map(|l| l.target_id).collect();
        let parent_ids: Vec<WorkItemId> = parent_links.iter().map(|l| l.target_id).collect();

        let mut to_page = child_ids.clone();
        to_page.extend(&parent_ids);
        let related = page_items(client, &config, &to_page).await?;

        let links: Vec<WorkItemLink> = child_links
            .into_iter()
            .chain(parent_links)
            .map(WorkItemLink::from)
            .collect();
        (links, parent_ids, child_ids, related)
    };

    // Stage 6: rehydrate persisted settings.
    let display_options = settings
        .load_display_options()
        .map_err(|e| FetchError::query(FetchStage::Settings, e.to_string()))?;
    let committed_overrides: HashMap<_, _> = settings
        .load_overrides()
        .map_err(|e| FetchError::query(FetchStage::Settings, e.to_string()))?;

    // Stage 7: one commit payload.
    let mut work_items = current_items;
    work_items.append(&mut related_items);
    links.sort_by_key(|l| (l.source, l.target));
    links.dedup();

    Ok(InitialLoad {
        scope: options.scope.clone(),
        iterations: iteration_records.into_iter().map(Into::into).collect(),
        work_items,
        links,
        current_level_ids,
        parent_level_ids,
        child_level_ids,
        display_options,
        committed_overrides,
    })
}

/// Convenience wrapper mirroring the original loading sequence: start in
/// the loading phase, run the task, commit on success or record the
/// terminal error.
pub async fn initialize_state(
    client: &dyn WorkTrackingClient,
    settings: &dyn SettingsStore,
    options: &InitializeOptions,
) -> TimelineState {
    let mut state = TimelineState::loading(options.scope.clone());
    match initialize(client, settings, options).await {
        Ok(load) => state.apply_initial_load(load),
        Err(error) => state.apply(sprintline_core::state::TimelineAction::LoadFailed {
            message: error.to_string(),
        }),
    }
    state
}

async fn page_items(
    client: &dyn WorkTrackingClient,
    config: &BacklogConfiguration,
    ids: &[WorkItemId],
) -> Result<Vec<WorkItem>, FetchError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let records = client
        .page_work_items(ids)
        .await
        .map_err(|e| FetchError::query(FetchStage::Paging, e.message))?;
    Ok(records
        .into_iter()
        .map(|record| record.into_work_item(config))
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TransportError;
    use crate::fixture::{FixtureClient, Snapshot};
    use crate::payload::{
        BacklogLevelRecord, IterationRecord, LinkRecord, MetaState, WorkItemRecord,
        WorkItemTypeStates,
    };
    use async_trait::async_trait;
    use sprintline_core::settings::MemoryStore;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn snapshot() -> Snapshot {
        let mut feature_states = HashMap::new();
        feature_states.insert("Active".to_string(), MetaState::InProgress);
        feature_states.insert("New".to_string(), MetaState::Proposed);
        let mut epic_states = HashMap::new();
        epic_states.insert("Active".to_string(), MetaState::InProgress);

        Snapshot {
            project: "proj".into(),
            team: "team".into(),
            backlog: BacklogConfiguration {
                portfolio_levels: vec![
                    BacklogLevelRecord {
                        name: "Epics".into(),
                        rank: 2,
                        work_item_types: vec!["Epic".into()],
                    },
                    BacklogLevelRecord {
                        name: "Features".into(),
                        rank: 1,
                        work_item_types: vec!["Feature".into()],
                    },
                ],
                requirement_level: BacklogLevelRecord {
                    name: "Stories".into(),
                    rank: 0,
                    work_item_types: vec!["User Story".into()],
                },
                type_states: vec![
                    WorkItemTypeStates {
                        work_item_type: "Feature".into(),
                        states: feature_states,
                    },
                    WorkItemTypeStates {
                        work_item_type: "Epic".into(),
                        states: epic_states,
                    },
                ],
            },
            iterations: (1..=4)
                .map(|i| IterationRecord {
                    id: format!("s{i}"),
                    name: format!("Sprint {i}"),
                    path: format!("Project\\s{i}"),
                    is_current: i == 2,
                    start_date: None,
                    finish_date: None,
                })
                .collect(),
            work_items: vec![
                record(1, "Epic", "Active", 1.0, "Project\\s1"),
                record(11, "Feature", "Active", 10.0, "Project\\s2"),
                record(12, "Feature", "New", 11.0, "Project\\s2"),
                record(21, "User Story", "Active", 20.0, "Project\\s3"),
            ],
            links: vec![
                LinkRecord {
                    source_id: 1,
                    target_id: 11,
                    relation_kind: "System.LinkTypes.Hierarchy-Forward".into(),
                },
                LinkRecord {
                    source_id: 11,
                    target_id: 21,
                    relation_kind: "System.LinkTypes.Hierarchy-Forward".into(),
                },
            ],
        }
    }

    fn record(id: u32, item_type: &str, state: &str, order: f64, path: &str) -> WorkItemRecord {
        WorkItemRecord {
            id,
            title: format!("Item {id}"),
            item_type: item_type.into(),
            state: state.into(),
            order_value: order,
            iteration_path: path.into(),
        }
    }

    fn options() -> InitializeOptions {
        InitializeOptions {
            scope: TeamScope {
                project_id: "proj".into(),
                team_id: "team".into(),
            },
            backlog_level: None,
        }
    }

    #[tokio::test]
    async fn happy_path_produces_one_commit_payload() {
        let client = FixtureClient::new(snapshot());
        let load = initialize(&client, &MemoryStore::new(), &options())
            .await
            .expect("load");

        // Feature 12 is "New" (not in progress) and is filtered out of the
        // display level.
        assert_eq!(load.current_level_ids, vec![11]);
        assert_eq!(load.parent_level_ids, vec![1]);
        assert_eq!(load.child_level_ids, vec![21]);
        assert_eq!(load.iterations.len(), 4);
        assert_eq!(load.links.len(), 2);

        let ids: Vec<_> = load.work_items.iter().map(|w| w.id).collect();
        assert!(ids.contains(&11) && ids.contains(&1) && ids.contains(&21));
    }

    #[tokio::test]
    async fn committed_state_is_ready_for_derivation() {
        let client = FixtureClient::new(snapshot());
        let state = initialize_state(&client, &MemoryStore::new(), &options()).await;
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.iterations.len(), 4);
        assert!(state.current_level_ids.contains(&11));
    }

    #[tokio::test]
    async fn settings_rehydrate_into_the_load() {
        let mut overrides = HashMap::new();
        overrides.insert(
            11,
            sprintline_core::model::CommittedOverride {
                start_iteration_id: "s1".into(),
                end_iteration_id: "s3".into(),
                user: "casey".into(),
            },
        );
        let settings = MemoryStore::with_contents(None, overrides);
        let client = FixtureClient::new(snapshot());
        let load = initialize(&client, &settings, &options())
            .await
            .expect("load");
        assert_eq!(
            load.committed_overrides.get(&11).map(|o| o.user.as_str()),
            Some("casey")
        );
    }

    #[tokio::test]
    async fn unknown_level_name_is_a_terminal_error() {
        let client = FixtureClient::new(snapshot());
        let options = InitializeOptions {
            backlog_level: Some("Initiatives".into()),
            ..options()
        };
        let err = initialize(&client, &MemoryStore::new(), &options)
            .await
            .expect_err("no such level");
        assert!(err.to_string().contains("Initiatives"));
    }

    #[tokio::test]
    async fn empty_display_level_skips_dependent_queries() {
        let mut snap = snapshot();
        snap.work_items.retain(|w| w.item_type != "Feature");
        let client = FixtureClient::new(snap);
        let load = initialize(&client, &MemoryStore::new(), &options())
            .await
            .expect("load");
        assert!(load.current_level_ids.is_empty());
        assert!(load.links.is_empty());
        assert!(load.parent_level_ids.is_empty());
    }

    // -----------------------------------------------------------------------
    // Failure injection
    // -----------------------------------------------------------------------

    /// Client that fails exactly one named call.
    struct FailingClient {
        inner: FixtureClient,
        fail_call: &'static str,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FailingClient {
        fn new(fail_call: &'static str) -> Self {
            Self {
                inner: FixtureClient::new(snapshot()),
                fail_call,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn check(&self, call: &'static str) -> Result<(), TransportError> {
            self.calls.lock().expect("lock").push(call);
            if call == self.fail_call {
                Err(TransportError::new(format!("{call} exploded")))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl WorkTrackingClient for FailingClient {
        async fn supports_backlog_configuration(&self) -> Result<bool, TransportError> {
            self.check("supports")?;
            self.inner.supports_backlog_configuration().await
        }

        async fn backlog_configuration(&self) -> Result<BacklogConfiguration, TransportError> {
            self.check("config")?;
            self.inner.backlog_configuration().await
        }

        async fn team_iterations(&self) -> Result<Vec<IterationRecord>, TransportError> {
            self.check("iterations")?;
            self.inner.team_iterations().await
        }

        async fn query_level_item_ids(
            &self,
            level: &BacklogLevelRecord,
        ) -> Result<Vec<sprintline_core::model::WorkItemId>, TransportError> {
            self.check("level-query")?;
            self.inner.query_level_item_ids(level).await
        }

        async fn query_links(
            &self,
            source_ids: &[sprintline_core::model::WorkItemId],
            direction: LinkDirection,
            target_level: &BacklogLevelRecord,
        ) -> Result<Vec<LinkRecord>, TransportError> {
            self.check("links")?;
            self.inner
                .query_links(source_ids, direction, target_level)
                .await
        }

        async fn page_work_items(
            &self,
            ids: &[sprintline_core::model::WorkItemId],
        ) -> Result<Vec<WorkItemRecord>, TransportError> {
            self.check("page")?;
            self.inner.page_work_items(ids).await
        }

        async fn save_iteration(
            &self,
            ids: &[sprintline_core::model::WorkItemId],
            iteration_path: &str,
        ) -> Result<(), TransportError> {
            self.check("save")?;
            self.inner.save_iteration(ids, iteration_path).await
        }
    }

    #[tokio::test]
    async fn failure_at_each_stage_is_terminal_and_verbatim() {
        for stage in ["supports", "config", "iterations", "level-query", "links", "page"] {
            let client = FailingClient::new(stage);
            let state = initialize_state(&client, &MemoryStore::new(), &options()).await;
            assert!(!state.loading);
            assert_eq!(
                state.error.as_deref(),
                Some(format!("{stage} exploded").as_str()),
                "stage {stage}"
            );
            // Single terminal error, store never partially populated.
            assert!(state.work_items.is_empty(), "stage {stage}");
            assert!(state.iterations.is_empty(), "stage {stage}");
        }
    }

    #[tokio::test]
    async fn link_failure_does_not_run_related_paging() {
        let client = FailingClient::new("links");
        let _ = initialize_state(&client, &MemoryStore::new(), &options()).await;
        let calls = client.calls.lock().expect("lock");
        let pages = calls.iter().filter(|c| **c == "page").count();
        assert_eq!(pages, 1, "only the display-level paging ran");
    }
}
