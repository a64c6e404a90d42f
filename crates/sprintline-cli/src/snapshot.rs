//! Snapshot loading and state construction for the CLI.
//!
//! Every command starts the same way: parse the snapshot document, wire a
//! settings store, and run the real initialize task against the fixture
//! client on a local runtime — the CLI exercises the exact code path the
//! hosted view uses.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use sprintline_core::settings::{JsonFileStore, MemoryStore, SettingsStore};
use sprintline_core::state::TimelineState;
use sprintline_core::window::TeamScope;
use sprintline_fetch::{FixtureClient, InitializeOptions, Snapshot, initialize_state};

/// Parse a snapshot document from disk.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read snapshot file {}", path.display()))?;
    Snapshot::from_json(&raw).with_context(|| format!("parse snapshot file {}", path.display()))
}

/// Settings store for the run: file-backed when a path is given,
/// otherwise volatile.
#[must_use]
pub fn settings_store(path: Option<&Path>) -> Box<dyn SettingsStore> {
    match path {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    }
}

/// Run the initialize task over the snapshot and return the committed (or
/// failed) timeline state.
pub fn load_state(
    snapshot_path: &Path,
    settings_path: Option<&Path>,
    backlog_level: Option<String>,
) -> Result<TimelineState> {
    let snapshot = load_snapshot(snapshot_path)?;
    let settings = settings_store(settings_path);
    let options = InitializeOptions {
        scope: TeamScope {
            project_id: snapshot.project.clone(),
            team_id: snapshot.team.clone(),
        },
        backlog_level,
    };
    let client = FixtureClient::new(snapshot);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    Ok(runtime.block_on(initialize_state(&client, settings.as_ref(), &options)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
