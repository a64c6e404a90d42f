//! Commit tasks for iteration changes.
//!
//! Two commit shapes exist:
//!
//! - **Move** — the item is rescheduled wholesale into one iteration; the
//!   server is the system of record, so this drives the save lifecycle
//!   actions and only rewrites the stored reference on success.
//! - **Pin** — a resize session is committed as a span override; the
//!   settings store is the system of record, the server value stays
//!   untouched. A failed persist rolls the pin back so no partial state
//!   is observable.

use sprintline_core::error::SaveError;
use sprintline_core::model::{CommittedOverride, WorkItemId};
use sprintline_core::settings::SettingsStore;
use sprintline_core::state::{TimelineAction, TimelineState};
use tracing::{debug, instrument};

use crate::client::WorkTrackingClient;

/// Drive a move commit: `SaveStarted` → server call → `SaveSucceeded` or
/// `SaveFailed`. A successful move also drops any pin on the moved items
/// (the stored value is authoritative again).
///
/// # Errors
///
/// [`SaveError`] with the server message verbatim; the state already
/// carries the inline per-item errors when this returns.
#[instrument(skip(client, settings, state))]
pub async fn commit_move(
    client: &dyn WorkTrackingClient,
    settings: &dyn SettingsStore,
    state: &mut TimelineState,
    work_item_ids: &[WorkItemId],
    iteration_id: &str,
) -> Result<(), SaveError> {
    let Some(ordinal) = state.iterations.ordinal_of(iteration_id) else {
        return Err(SaveError::new(
            work_item_ids.to_vec(),
            format!("iteration '{iteration_id}' is not part of the team schedule"),
        ));
    };
    let iteration_path = state
        .iterations
        .get(ordinal)
        .map(|i| i.path.clone())
        .unwrap_or_default();

    state.apply(TimelineAction::SaveStarted {
        work_item_ids: work_item_ids.to_vec(),
    });

    match client.save_iteration(work_item_ids, &iteration_path).await {
        Ok(()) => {
            state.apply(TimelineAction::SaveSucceeded {
                work_item_ids: work_item_ids.to_vec(),
                iteration_path,
            });
            for id in work_item_ids {
                if state.committed_overrides.contains_key(id) {
                    debug!(id, "move supersedes pin");
                    state.apply(TimelineAction::OverrideCleared { work_item_id: *id });
                }
            }
            persist_overrides(settings, state, work_item_ids)?;
            Ok(())
        }
        Err(transport) => {
            state.apply(TimelineAction::SaveFailed {
                work_item_ids: work_item_ids.to_vec(),
                message: transport.message.clone(),
            });
            Err(SaveError::new(work_item_ids.to_vec(), transport.message))
        }
    }
}

/// Commit the active resize session as a pin for `work_item_id`.
///
/// The session's proposed span becomes the persisted override; the
/// session closes. A failed persist clears the pin again, restoring the
/// pre-edit stored span exactly.
///
/// # Errors
///
/// [`SaveError`] when no session targets the item (a commit is only valid
/// after an override start for that item) or when persistence fails.
#[instrument(skip(settings, state))]
pub fn commit_pin(
    settings: &dyn SettingsStore,
    state: &mut TimelineState,
    work_item_id: WorkItemId,
) -> Result<(), SaveError> {
    let Some(session) = state
        .override_session
        .as_ref()
        .filter(|s| s.work_item_id == work_item_id)
    else {
        return Err(SaveError::new(
            vec![work_item_id],
            "no active resize session for this work item",
        ));
    };

    let pinned = CommittedOverride {
        start_iteration_id: session.proposed_start.clone(),
        end_iteration_id: session.proposed_end.clone(),
        user: session.user.clone(),
    };
    state.apply(TimelineAction::OverridePinned {
        work_item_id,
        pinned,
    });

    if let Err(error) = settings.save_overrides(&state.committed_overrides) {
        state.apply(TimelineAction::OverrideCleared { work_item_id });
        let message = error.to_string();
        state.apply(TimelineAction::SaveFailed {
            work_item_ids: vec![work_item_id],
            message: message.clone(),
        });
        return Err(SaveError::new(vec![work_item_id], message));
    }
    Ok(())
}

fn persist_overrides(
    settings: &dyn SettingsStore,
    state: &TimelineState,
    work_item_ids: &[WorkItemId],
) -> Result<(), SaveError> {
    settings
        .save_overrides(&state.committed_overrides)
        .map_err(|error| SaveError::new(work_item_ids.to_vec(), error.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
